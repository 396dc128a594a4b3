/// サイト記述（コンテンツ・連絡先・表示演出の調整値）
///
/// デフォルトはバイナリに埋め込んだ assets/site.json を使い、
/// コマンドラインでファイルを指定した場合はそちらを読み込む。

use crate::reveal::transition::{Easing, RevealTransition, DEFAULT_DISPLACEMENT_PX, DEFAULT_DURATION_MS};
use crate::reveal::watcher::{ObserveOptions, RootMargin, DEFAULT_ROOT_MARGIN, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 埋め込みのサイト記述
pub const EMBEDDED_SITE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/site.json"));

fn default_stagger() -> u32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub brand: Brand,
    pub contact: Contact,
    #[serde(default)]
    pub nav: Vec<NavLink>,
    pub sections: Vec<Section>,
    pub footer: Footer,
    #[serde(default)]
    pub reveal: RevealSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    pub initial: String,
    #[serde(default)]
    pub tagline: String,
}

/// 外部メッセージングへのディープリンク
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub url: String,
    pub label: String,
    #[serde(default)]
    pub mobile_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavLink {
    pub label: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub id: Option<String>,
    /// 背景色
    #[serde(default = "default_theme")]
    pub theme: String,
    /// 先頭ブロック以降を横並びの列にする（md以上）
    #[serde(default)]
    pub split: bool,
    pub blocks: Vec<Block>,
}

fn default_theme() -> String {
    "#ffffff".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Hero {
        badge: String,
        headline: String,
        highlight: String,
        headline_tail: String,
        lead: String,
        cta_label: String,
        secondary: NavLink,
        #[serde(default)]
        tags: Vec<String>,
        portrait: Image,
        #[serde(default = "default_portrait_delay")]
        portrait_delay_ms: u32,
    },
    Heading {
        #[serde(default)]
        eyebrow: Option<String>,
        title: String,
        #[serde(default)]
        subtitle: Option<String>,
    },
    Checklist {
        items: Vec<String>,
        #[serde(default = "default_stagger")]
        stagger_ms: u32,
    },
    Quote {
        text: String,
        #[serde(default)]
        delay_ms: u32,
    },
    Cards {
        items: Vec<Card>,
        #[serde(default = "default_stagger")]
        stagger_ms: u32,
    },
    Profile {
        badge: String,
        title: String,
        paragraphs: Vec<String>,
        image: Image,
        cta_label: String,
    },
    InfoGrid {
        items: Vec<InfoItem>,
        #[serde(default = "default_stagger")]
        stagger_ms: u32,
    },
    Note {
        title: String,
        text: String,
        #[serde(default)]
        delay_ms: u32,
    },
    Faq {
        items: Vec<FaqItem>,
        #[serde(default = "default_stagger")]
        stagger_ms: u32,
    },
    CallToAction {
        title: String,
        text: String,
        cta_label: String,
    },
}

fn default_portrait_delay() -> u32 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub src: String,
    pub alt: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub icon: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub accent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfoItem {
    pub icon: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub links: Vec<FooterLink>,
    pub copyright: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub href: String,
}

/// 表示演出の調整値
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealSettings {
    pub threshold: f64,
    pub root_margin: String,
    pub duration_ms: u32,
    pub displacement_px: f32,
    pub easing: EasingName,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EasingName {
    Linear,
    EaseOut,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN.to_string(),
            duration_ms: DEFAULT_DURATION_MS,
            displacement_px: DEFAULT_DISPLACEMENT_PX,
            easing: EasingName::EaseOut,
        }
    }
}

impl RevealSettings {
    pub fn observe_options(&self) -> Result<ObserveOptions, String> {
        let root_margin = RootMargin::parse(&self.root_margin)?;
        Ok(ObserveOptions::new(self.threshold, root_margin))
    }

    pub fn transition(&self) -> RevealTransition {
        RevealTransition {
            duration_ms: self.duration_ms,
            displacement_px: self.displacement_px,
            easing: match self.easing {
                EasingName::Linear => Easing::Linear,
                EasingName::EaseOut => Easing::EaseOut,
            },
        }
    }
}

impl SiteConfig {
    pub fn from_json(source: &str) -> Result<Self, String> {
        serde_json::from_str(source).map_err(|e| format!("Failed to parse site description: {}", e))
    }

    pub fn embedded() -> Result<Self, String> {
        Self::from_json(EMBEDDED_SITE)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_json(&source)
    }

    /// idを持つセクションの一覧（ページ順）
    pub fn section_ids(&self) -> Vec<&str> {
        self.sections.iter().filter_map(|s| s.id.as_deref()).collect()
    }

    /// FAQブロックの項目（最初に見つかったもの）
    pub fn faq_items(&self) -> &[FaqItem] {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .find_map(|b| match b {
                Block::Faq { items, .. } => Some(items.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_site_parses() {
        let config = SiteConfig::embedded().unwrap();
        assert_eq!(config.brand.name, "Psi. Mayara Luna");
        assert!(config.contact.url.starts_with("https://wa.me/"));
        assert_eq!(config.section_ids(), vec!["quem-sou", "sobre", "faq"]);
        assert_eq!(config.faq_items().len(), 4);
        assert_eq!(config.reveal, RevealSettings::default());
    }

    #[test]
    fn test_reveal_settings_defaults_fill_missing_fields() {
        let settings: RevealSettings = serde_json::from_str(r#"{ "threshold": 0.25 }"#).unwrap();
        assert_eq!(settings.threshold, 0.25);
        assert_eq!(settings.root_margin, "0px 0px -50px 0px");
        assert_eq!(settings.duration_ms, 1000);

        let options = settings.observe_options().unwrap();
        assert_eq!(options.threshold, 0.25);
        assert_eq!(options.root_margin, RootMargin::default());
    }

    #[test]
    fn test_bad_margin_is_reported() {
        let settings = RevealSettings {
            root_margin: "down a bit".to_string(),
            ..Default::default()
        };
        assert!(settings.observe_options().is_err());
    }

    #[test]
    fn test_block_tagging() {
        let block: Block = serde_json::from_str(
            r#"{ "kind": "checklist", "items": ["a", "b"] }"#,
        )
        .unwrap();
        match block {
            Block::Checklist { items, stagger_ms } => {
                assert_eq!(items.len(), 2);
                assert_eq!(stagger_ms, 100);
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = SiteConfig::from_json("{ not json").unwrap_err();
        assert!(err.starts_with("Failed to parse site description"));
    }
}
