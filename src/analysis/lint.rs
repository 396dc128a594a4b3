use super::error::Diagnostic;
use crate::reveal::watcher::RootMargin;
use crate::site::config::{Block, SiteConfig};

/// これを超えるユニット数は観測負荷として注意を出す
const MAX_COMFORTABLE_UNITS: usize = 40;

pub fn run_lints(config: &SiteConfig) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    // 表示演出の設定チェック
    let reveal = &config.reveal;
    if !(0.0..=1.0).contains(&reveal.threshold) || reveal.threshold.is_nan() {
        diags.push(
            Diagnostic::error(format!("Reveal threshold {} must be between 0 and 1", reveal.threshold))
                .at("reveal.threshold"),
        );
    }
    if let Err(e) = RootMargin::parse(&reveal.root_margin) {
        diags.push(Diagnostic::error(e).at("reveal.root_margin"));
    }
    if reveal.duration_ms == 0 {
        diags.push(Diagnostic::warning("Reveal duration is 0ms, blocks will pop in without animation").at("reveal.duration_ms"));
    }
    if reveal.displacement_px < 0.0 {
        diags.push(
            Diagnostic::warning(format!(
                "Reveal displacement {}px is negative, blocks will slide down instead of up",
                reveal.displacement_px
            ))
            .at("reveal.displacement_px"),
        );
    }

    // 連絡先チェック
    let url = config.contact.url.trim();
    if url.is_empty() {
        diags.push(Diagnostic::error("Contact URL is empty").at("contact.url"));
    } else if !url.starts_with("https://") {
        diags.push(Diagnostic::warning(format!("Contact URL '{}' is not https", url)).at("contact.url"));
    }

    // 重複セクションIDチェック
    let mut id_counts = std::collections::HashMap::new();
    for id in config.section_ids() {
        *id_counts.entry(id).or_insert(0) += 1;
    }
    let mut duplicated: Vec<_> = id_counts.iter().filter(|(_, count)| **count > 1).collect();
    duplicated.sort();
    for (id, count) in duplicated {
        diags.push(Diagnostic::error(format!(
            "Section id '{}' is defined more than once ({} times)",
            id, count
        )));
    }

    // ナビゲーション参照チェック
    let ids: std::collections::HashSet<_> = config.section_ids().into_iter().collect();
    for (i, link) in config.nav.iter().enumerate() {
        if !ids.contains(link.target.as_str()) {
            diags.push(
                Diagnostic::error(format!(
                    "Nav link '{}' points to section '{}' which does not exist",
                    link.label, link.target
                ))
                .at(format!("nav[{}]", i)),
            );
        }
    }

    // ブロックの内容チェック
    let mut unit_count = 0;
    for (si, section) in config.sections.iter().enumerate() {
        for (bi, block) in section.blocks.iter().enumerate() {
            let location = format!("sections[{}].blocks[{}]", si, bi);
            unit_count += match block {
                Block::Hero { secondary, .. } => {
                    if !ids.contains(secondary.target.as_str()) {
                        diags.push(
                            Diagnostic::error(format!(
                                "Hero button points to section '{}' which does not exist",
                                secondary.target
                            ))
                            .at(location.clone()),
                        );
                    }
                    2
                }
                Block::Checklist { items, .. } => items.len(),
                Block::Cards { items, .. } => items.len(),
                Block::InfoGrid { items, .. } => items.len(),
                Block::Faq { items, .. } => {
                    if items.is_empty() {
                        diags.push(Diagnostic::info("FAQ block has no questions").at(location.clone()));
                    }
                    for (qi, item) in items.iter().enumerate() {
                        if item.question.trim().is_empty() || item.answer.trim().is_empty() {
                            diags.push(
                                Diagnostic::warning(format!("FAQ item {} has an empty question or answer", qi))
                                    .at(location.clone()),
                            );
                        }
                    }
                    items.len()
                }
                _ => 1,
            };
        }
    }

    if unit_count > MAX_COMFORTABLE_UNITS {
        diags.push(Diagnostic::info(format!(
            "Page has {} reveal blocks; consider fewer observed elements",
            unit_count
        )));
    }

    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::error::DiagnosticLevel;
    use crate::site::config::NavLink;

    fn messages(diags: &[Diagnostic], level: DiagnosticLevel) -> Vec<String> {
        diags
            .iter()
            .filter(|d| d.level == level)
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_embedded_site_is_clean() {
        let config = SiteConfig::embedded().unwrap();
        let diags = run_lints(&config);
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_reveal_settings_errors() {
        let mut config = SiteConfig::embedded().unwrap();
        config.reveal.threshold = 1.5;
        config.reveal.root_margin = "-50".to_string();
        config.reveal.duration_ms = 0;

        let diags = run_lints(&config);
        let errors = messages(&diags, DiagnosticLevel::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("threshold"));
        assert_eq!(messages(&diags, DiagnosticLevel::Warning).len(), 1);
    }

    #[test]
    fn test_broken_nav_target_and_duplicates() {
        let mut config = SiteConfig::embedded().unwrap();
        config.nav.push(NavLink {
            label: "Blog".to_string(),
            target: "blog".to_string(),
        });
        config.sections[0].id = Some("faq".to_string());

        let diags = run_lints(&config);
        let errors = messages(&diags, DiagnosticLevel::Error);
        assert!(errors.iter().any(|m| m.contains("'blog'")));
        assert!(errors.iter().any(|m| m.contains("'faq' is defined more than once")));
        let nav = diags.iter().find(|d| d.message.contains("'blog'")).unwrap();
        assert_eq!(nav.location.as_deref(), Some("nav[3]"));
    }

    #[test]
    fn test_contact_url_checks() {
        let mut config = SiteConfig::embedded().unwrap();
        config.contact.url = "http://wa.me/1".to_string();
        assert_eq!(messages(&run_lints(&config), DiagnosticLevel::Warning).len(), 1);

        config.contact.url = "  ".to_string();
        assert_eq!(messages(&run_lints(&config), DiagnosticLevel::Error), vec!["Contact URL is empty".to_string()]);
    }
}
