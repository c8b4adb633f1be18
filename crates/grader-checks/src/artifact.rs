/// Pure scoring for repository artifacts fetched next to the deployed page.

/// Score a LICENSE file. Only MIT counts: 1.0 when the file mentions it,
/// 0.0 for anything else, including absent or empty files.
pub fn license_score(content: Option<&str>) -> (f64, String) {
    let Some(content) = content else {
        return (0.0, "no LICENSE file found".to_string());
    };
    let text = content.trim();
    if text.is_empty() {
        return (0.0, "LICENSE file is empty".to_string());
    }
    if text.to_lowercase().contains("mit") {
        (1.0, "MIT license found".to_string())
    } else {
        (0.0, "LICENSE file exists but is not MIT".to_string())
    }
}

/// Score a README on four independent signals worth 0.25 each: present,
/// substantial, titled, and documenting usage or setup.
pub fn readme_score(content: Option<&str>) -> (f64, String) {
    let Some(content) = content else {
        return (0.0, "no README.md found".to_string());
    };
    let text = content.trim();
    if text.is_empty() {
        return (0.0, "README.md is empty".to_string());
    }

    let mut score = 0.25;
    let mut notes = vec!["present"];
    if text.len() >= 200 {
        score += 0.25;
        notes.push("substantial");
    }
    if text.lines().any(|l| l.trim_start().starts_with('#')) {
        score += 0.25;
        notes.push("titled");
    }
    let lowered = text.to_lowercase();
    if lowered.contains("usage")
        || lowered.contains("how to")
        || lowered.contains("setup")
        || lowered.contains("install")
        || lowered.contains("```")
    {
        score += 0.25;
        notes.push("documents usage");
    }
    (score, notes.join(", "))
}

/// Heuristic code quality over the project's fetched sources, five signals
/// worth 0.2 each: nontrivial length, declarations, wired-up event handling,
/// styling, and comments.
pub fn code_quality_score(combined: &str) -> (f64, String) {
    let code = combined.trim();
    if code.is_empty() {
        return (0.0, "no code files found".to_string());
    }

    let mut score = 0.0;
    let mut notes = Vec::new();
    if code.len() > 100 {
        score += 0.2;
        notes.push("nontrivial length");
    }
    if ["function", "const", "let"].iter().any(|k| code.contains(k)) {
        score += 0.2;
        notes.push("declares functions or variables");
    }
    if ["addEventListener", "onclick", "querySelector"]
        .iter()
        .any(|k| code.contains(k))
    {
        score += 0.2;
        notes.push("wires up interactivity");
    }
    if code.to_lowercase().contains("style") || code.contains(".css") {
        score += 0.2;
        notes.push("styled");
    }
    if code.contains("//") || code.contains("/*") {
        score += 0.2;
        notes.push("commented");
    }
    if notes.is_empty() {
        notes.push("no quality signals found");
    }
    (score, notes.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mit_license_scores_full() {
        let (score, reason) = license_score(Some("MIT License\n\nCopyright (c) 2025"));
        assert_eq!(score, 1.0);
        assert!(reason.contains("MIT"));
    }

    #[test]
    fn non_mit_license_scores_zero() {
        let (score, reason) = license_score(Some("Apache License\nVersion 2.0"));
        assert_eq!(score, 0.0);
        assert!(reason.contains("not MIT"));
    }

    #[test]
    fn missing_or_empty_license_scores_zero() {
        assert_eq!(license_score(None).0, 0.0);
        assert_eq!(license_score(Some("   \n")).0, 0.0);
    }

    #[test]
    fn full_readme_scores_one() {
        let readme = format!(
            "# Calculator\n\nA small calculator app.\n\n## Usage\n\nOpen index.html.\n\n{}",
            "padding ".repeat(30)
        );
        let (score, reason) = readme_score(Some(&readme));
        assert_eq!(score, 1.0);
        assert!(reason.contains("titled"));
    }

    #[test]
    fn bare_readme_scores_quarter() {
        let (score, _) = readme_score(Some("my project"));
        assert_eq!(score, 0.25);
    }

    #[test]
    fn missing_readme_scores_zero() {
        assert_eq!(readme_score(None).0, 0.0);
    }

    #[test]
    fn full_signal_code_scores_one() {
        let code = format!(
            "// calculator logic\nconst display = document.querySelector('.display');\n\
             function press(key) {{ display.textContent += key; }}\n\
             document.body.addEventListener('click', press);\n\
             /* styles */ .display {{ font-style: bold; }}\n{}",
            "padding ".repeat(10)
        );
        let (score, reason) = code_quality_score(&code);
        assert_eq!(score, 1.0);
        assert!(reason.contains("interactivity"));
    }

    #[test]
    fn bare_markup_scores_on_length_alone() {
        let html = format!("<html><body>{}</body></html>", "<p>hi</p>".repeat(20));
        let (score, _) = code_quality_score(&html);
        assert_eq!(score, 0.2);
    }

    #[test]
    fn empty_code_scores_zero() {
        assert_eq!(code_quality_score("   ").0, 0.0);
    }
}
