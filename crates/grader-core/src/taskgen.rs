use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::catalog::Catalog;
use crate::check::Check;
use crate::error::GenerateError;
use crate::model::Attachment;
use crate::template::{RoundSpec, Template};

/// A fully parametrized assignment, ready to be recorded and dispatched.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedTask {
    pub task_id: String,
    pub template_id: String,
    pub brief: String,
    pub attachments: Vec<Attachment>,
    pub checks: Vec<Check>,
}

/// Deterministic per-participant seed: the same email within the same hour
/// bucket always produces the same draw.
pub fn seed_for(email: &str, hour_bucket: &str) -> u64 {
    let digest = Sha256::digest(format!("{email}-{hour_bucket}").as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}

/// Pick and parametrize a round-1 task for a participant. Template choice
/// and parameter sampling each run on a fresh seeded rng so neither draw
/// perturbs the other.
///
/// # Panics
///
/// Panics when the catalog holds no templates; there is nothing to draw.
pub fn generate_round1(catalog: &Catalog, email: &str, hour_bucket: &str) -> GeneratedTask {
    assert!(!catalog.is_empty(), "template catalog is empty");
    let seed = seed_for(email, hour_bucket);
    let mut rng = StdRng::seed_from_u64(seed);
    let index = rng.gen_range(0..catalog.len());
    let template = &catalog.templates()[index];
    parametrize(template, 1, seed)
}

/// Parametrize the round-2 enhancement of whatever template the participant
/// was assigned in round 1, recovered from the round-1 task id.
pub fn generate_round2(
    catalog: &Catalog,
    email: &str,
    hour_bucket: &str,
    round1_task_id: &str,
) -> Result<GeneratedTask, GenerateError> {
    let template_id = template_id_from_task_id(round1_task_id);
    let template = catalog
        .get(template_id)
        .ok_or_else(|| GenerateError::TemplateNotFound {
            task_id: round1_task_id.to_string(),
        })?;
    Ok(parametrize(template, 2, seed_for(email, hour_bucket)))
}

/// Strip the trailing `-xxxxx` digest suffix off a task id.
pub fn template_id_from_task_id(task_id: &str) -> &str {
    match task_id.rsplit_once('-') {
        Some((template_id, _)) => template_id,
        None => task_id,
    }
}

/// Fill a round's brief placeholders from a seeded draw and derive the task
/// id from the materialized content, so identical content maps to an
/// identical id.
pub fn parametrize(template: &Template, round: u32, seed: u64) -> GeneratedTask {
    let spec = template.round_spec(round);
    let brief = fill_brief(spec, seed);
    let task_id = task_id(&template.id, &brief, &spec.attachments);
    GeneratedTask {
        task_id,
        template_id: template.id.clone(),
        brief,
        attachments: spec.attachments.clone(),
        checks: spec.checks.clone(),
    }
}

fn fill_brief(spec: &RoundSpec, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut brief = spec.brief.clone();
    for (key, options) in &spec.params {
        let value = &options[rng.gen_range(0..options.len())];
        brief = brief.replace(&format!("{{{key}}}"), value);
    }
    brief
}

fn task_id(template_id: &str, brief: &str, attachments: &[Attachment]) -> String {
    let attachments_json =
        serde_json::to_string(attachments).unwrap_or_else(|_| "[]".to_string());
    let mut hasher = Sha256::new();
    hasher.update(brief.as_bytes());
    hasher.update(attachments_json.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{template_id}-{}", &digest[..5])
}
