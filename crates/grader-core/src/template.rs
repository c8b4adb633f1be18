use crate::check::Check;
use crate::model::Attachment;

/// Per-round content of a template: a brief with `{placeholder}` tokens, the
/// allowed values for each token, and the attachments/checks shipped
/// verbatim with every task generated from this round.
///
/// Params are an ordered list, not a map: the seeded generator samples one
/// value per token in declaration order, so ordering is part of the
/// determinism contract.
#[derive(Clone, Debug)]
pub struct RoundSpec {
    pub brief: String,
    pub params: Vec<(String, Vec<String>)>,
    pub attachments: Vec<Attachment>,
    pub checks: Vec<Check>,
}

impl RoundSpec {
    pub fn new(brief: &str) -> Self {
        Self {
            brief: brief.to_string(),
            params: Vec::new(),
            attachments: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, options: &[&str]) -> Self {
        self.params
            .push((key.to_string(), options.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

/// A catalog entry defining one kind of assignment across both rounds.
#[derive(Clone, Debug)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub round1: RoundSpec,
    pub round2: RoundSpec,
}

impl Template {
    pub fn round_spec(&self, round: u32) -> &RoundSpec {
        if round == 1 {
            &self.round1
        } else {
            &self.round2
        }
    }
}
