// ========================================
// ページ構成
// ========================================
//
// SiteConfig のセクション列を、表示演出の単位（RevealUnit）の列に展開する。
// 各ユニットはリスト内の位置から決まる遅延（index * stagger）と、
// ネイティブのスクロールシミュレーション用に見積もったドキュメント座標の矩形を持つ。

use super::config::{Block, Card, FaqItem, Image, InfoItem, NavLink, SiteConfig};
use crate::reveal::geometry::Rect;
use crate::ui::viewport::Viewport;
use std::collections::HashMap;

/// 固定ナビゲーションバーの高さ
pub const NAV_HEIGHT: f32 = 80.0;
/// コンテンツの最大幅
pub const MAX_CONTENT_WIDTH: f32 = 1152.0;

const SECTION_PADDING: f32 = 80.0;
const ROW_GAP: f32 = 48.0;
const ITEM_GAP: f32 = 16.0;
const GRID_GAP: f32 = 24.0;
const FOOTER_HEIGHT: f32 = 220.0;

/// 表示演出の単位となるコンテンツ
#[derive(Debug, Clone, PartialEq)]
pub enum UnitContent {
    HeroText {
        badge: String,
        headline: String,
        highlight: String,
        headline_tail: String,
        lead: String,
        cta_label: String,
        secondary: NavLink,
        tags: Vec<String>,
    },
    Portrait(Image),
    Heading {
        eyebrow: Option<String>,
        title: String,
        subtitle: Option<String>,
    },
    ChecklistItem(String),
    Quote(String),
    Card(Card),
    Profile {
        badge: String,
        title: String,
        paragraphs: Vec<String>,
        image: Image,
        cta_label: String,
    },
    InfoItem(InfoItem),
    Note {
        title: String,
        text: String,
    },
    FaqItem {
        index: usize,
        item: FaqItem,
    },
    CallToAction {
        title: String,
        text: String,
        cta_label: String,
    },
}

impl UnitContent {
    /// 種類名（キー生成とログ用）
    pub fn kind(&self) -> &'static str {
        match self {
            UnitContent::HeroText { .. } => "hero",
            UnitContent::Portrait(_) => "portrait",
            UnitContent::Heading { .. } => "heading",
            UnitContent::ChecklistItem(_) => "check",
            UnitContent::Quote(_) => "quote",
            UnitContent::Card(_) => "card",
            UnitContent::Profile { .. } => "profile",
            UnitContent::InfoItem(_) => "info",
            UnitContent::Note { .. } => "note",
            UnitContent::FaqItem { .. } => "faq",
            UnitContent::CallToAction { .. } => "cta",
        }
    }

    /// 幅に対する高さの見積もり
    pub fn estimated_height(&self, width: f32, wide: bool) -> f32 {
        match self {
            UnitContent::HeroText { headline, highlight, headline_tail, lead, tags, .. } => {
                let headline_px = if wide { 56.0 } else { 36.0 };
                let full = format!("{} {} {}", headline, highlight, headline_tail);
                let tag_rows = if wide { 1.0 } else { (tags.len() as f32 / 3.0).ceil() };
                40.0 + 24.0
                    + text_height(&full, width, headline_px, 1.15)
                    + 24.0
                    + text_height(lead, width, 20.0, 1.6)
                    + 32.0
                    + if wide { 60.0 } else { 136.0 }
                    + 32.0
                    + tag_rows * 44.0
            }
            UnitContent::Portrait(_) => (width * 1.25).min(640.0),
            UnitContent::Heading { eyebrow, title, subtitle } => {
                let title_px = if wide { 36.0 } else { 30.0 };
                eyebrow.as_ref().map_or(0.0, |_| 28.0)
                    + text_height(title, width, title_px, 1.25)
                    + subtitle
                        .as_ref()
                        .map_or(0.0, |s| 16.0 + text_height(s, width.min(672.0), 18.0, 1.6))
                    + 24.0
            }
            UnitContent::ChecklistItem(text) => 32.0 + text_height(text, width - 48.0, 18.0, 1.5),
            UnitContent::Quote(_) => {
                if wide {
                    384.0
                } else {
                    288.0
                }
            }
            UnitContent::Card(card) => {
                64.0 + 64.0 + 24.0
                    + text_height(&card.title, width - 64.0, 20.0, 1.4)
                    + 12.0
                    + text_height(&card.text, width - 64.0, 16.0, 1.6)
                    + 8.0
            }
            UnitContent::Profile { title, paragraphs, .. } => {
                let text_width = if wide { width - 256.0 - 40.0 - 96.0 } else { width - 64.0 };
                let body: f32 = paragraphs
                    .iter()
                    .map(|p| text_height(p, text_width, 16.0, 1.6) + 16.0)
                    .sum();
                let text_block = 32.0 + text_height(title, text_width, 30.0, 1.25) + body + 64.0 + 48.0;
                if wide {
                    96.0 + text_block.max(256.0)
                } else {
                    64.0 + 192.0 + 40.0 + text_block
                }
            }
            UnitContent::InfoItem(item) => {
                48.0 + (text_height(&item.title, width - 100.0, 18.0, 1.4)
                    + text_height(&item.text, width - 100.0, 16.0, 1.5))
                .max(52.0)
            }
            UnitContent::Note { title, text } => {
                64.0 + text_height(title, width - 64.0, 18.0, 1.5)
                    + 8.0
                    + text_height(text, width.min(512.0), 16.0, 1.6)
            }
            UnitContent::FaqItem { item, .. } => 48.0 + text_height(&item.question, width - 96.0, 18.0, 1.5),
            UnitContent::CallToAction { title, text, .. } => {
                let title_px = if wide { 48.0 } else { 30.0 };
                text_height(title, width, title_px, 1.2)
                    + 24.0
                    + text_height(text, width.min(576.0), 20.0, 1.6)
                    + 40.0
                    + 76.0
                    + 64.0
            }
        }
    }
}

/// 文字数から折り返し行数を見積もった高さ
fn text_height(text: &str, width: f32, font_px: f32, line_height: f32) -> f32 {
    let per_line = (width.max(1.0) / (font_px * 0.55)).floor().max(1.0);
    let chars = text.chars().count().max(1) as f32;
    (chars / per_line).ceil() * font_px * line_height
}

/// 表示演出の単位
#[derive(Debug, Clone, PartialEq)]
pub struct RevealUnit {
    /// セクション内で一意なキー（"quem-sou/check/2" など）
    pub key: String,
    pub section: usize,
    pub delay_ms: u32,
    pub content: UnitContent,
    pub rect: Rect,
}

/// ブロック内のユニットの並べ方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    Stack,
    /// md以上で指定列数のグリッド
    Grid(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub layout: RowLayout,
    pub units: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSection {
    pub id: Option<String>,
    pub theme: String,
    pub split: bool,
    pub rows: Vec<Row>,
    pub rect: Rect,
}

/// 構成済みページ
#[derive(Debug, Clone)]
pub struct Page {
    pub sections: Vec<ComposedSection>,
    pub units: Vec<RevealUnit>,
    pub content_height: f32,
    pub viewport: Viewport,
}

impl Page {
    /// サイト記述をビューポート幅に合わせて構成する
    pub fn compose(config: &SiteConfig, viewport: Viewport) -> Self {
        let mut sections = Vec::new();
        let mut units = Vec::new();

        for (section_index, section) in config.sections.iter().enumerate() {
            let prefix = section
                .id
                .clone()
                .unwrap_or_else(|| format!("section-{}", section_index));
            let mut rows = Vec::new();
            // 種類ごとの通し番号
            let mut kind_counts: HashMap<&'static str, usize> = HashMap::new();

            for block in &section.blocks {
                let (layout, contents) = expand_block(block);
                let mut row = Row {
                    layout,
                    units: Vec::new(),
                };
                for (delay_ms, content) in contents {
                    let counter = kind_counts.entry(content.kind()).or_insert(0);
                    let key = format!("{}/{}/{}", prefix, content.kind(), counter);
                    *counter += 1;
                    row.units.push(units.len());
                    units.push(RevealUnit {
                        key,
                        section: section_index,
                        delay_ms,
                        content,
                        rect: Rect::new(0.0, 0.0, 0.0, 0.0),
                    });
                }
                rows.push(row);
            }

            sections.push(ComposedSection {
                id: section.id.clone(),
                theme: section.theme.clone(),
                split: section.split,
                rows,
                rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            });
        }

        let mut page = Self {
            sections,
            units,
            content_height: 0.0,
            viewport,
        };
        page.layout();
        log::debug!(
            "page composed: {} sections, {} reveal units, {:.0}px tall at {}px wide",
            page.sections.len(),
            page.units.len(),
            page.content_height,
            viewport.size[0]
        );
        page
    }

    /// 縦積みの簡易レイアウトで各ユニットの矩形を見積もる
    fn layout(&mut self) {
        let wide = self.viewport.is_wide();
        let content_width = (self.viewport.size[0] - 32.0).clamp(1.0, MAX_CONTENT_WIDTH);
        let left = ((self.viewport.size[0] - content_width) / 2.0).max(0.0);
        let mut y = 0.0;

        for section_index in 0..self.sections.len() {
            let section_top = y;
            // 先頭セクション（ヒーロー）は固定ナビの下から始まる
            let top_padding = if section_index == 0 {
                if wide { 160.0 } else { 128.0 }
            } else {
                SECTION_PADDING
            };
            y += top_padding;

            let rows = self.sections[section_index].rows.clone();
            let split = self.sections[section_index].split && wide && rows.len() > 1;

            if split {
                // 先頭行は全幅、残りは横並びの列
                y = self.place_row(&rows[0], left, y, content_width, wide) + ROW_GAP;
                let columns = rows.len() - 1;
                let column_width = (content_width - GRID_GAP * (columns as f32 - 1.0)) / columns as f32;
                let mut bottom: f32 = y;
                for (i, row) in rows[1..].iter().enumerate() {
                    let x = left + i as f32 * (column_width + GRID_GAP);
                    bottom = bottom.max(self.place_row(row, x, y, column_width, wide));
                }
                y = bottom;
            } else {
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        y += ROW_GAP;
                    }
                    y = self.place_row(row, left, y, content_width, wide);
                }
            }

            y += SECTION_PADDING;
            self.sections[section_index].rect =
                Rect::new(0.0, section_top, self.viewport.size[0], y - section_top);
        }

        self.content_height = y + FOOTER_HEIGHT;
    }

    /// 1行分のユニットを配置して下端を返す
    fn place_row(&mut self, row: &Row, x: f32, y: f32, width: f32, wide: bool) -> f32 {
        let columns = match row.layout {
            RowLayout::Grid(n) if wide => n.max(1),
            _ => 1,
        };
        let gap = if columns > 1 { GRID_GAP } else { ITEM_GAP };
        let cell_width = (width - gap * (columns as f32 - 1.0)) / columns as f32;

        let mut cursor = y;
        for line in row.units.chunks(columns) {
            let mut line_height: f32 = 0.0;
            for (column, &unit_index) in line.iter().enumerate() {
                let unit = &mut self.units[unit_index];
                let height = unit.content.estimated_height(cell_width, wide);
                unit.rect = Rect::new(x + column as f32 * (cell_width + gap), cursor, cell_width, height);
                line_height = line_height.max(height);
            }
            cursor += line_height + gap;
        }
        // 最後の行間は含めない
        if row.units.is_empty() { y } else { cursor - gap }
    }

    /// スクロール先となるセクションの上端
    pub fn section_offset(&self, id: &str) -> Option<f32> {
        self.sections
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
            .map(|s| s.rect.top())
    }

    pub fn units_in_section(&self, section: usize) -> impl Iterator<Item = (usize, &RevealUnit)> {
        self.units.iter().enumerate().filter(move |(_, u)| u.section == section)
    }

    pub fn unit_by_key(&self, key: &str) -> Option<&RevealUnit> {
        self.units.iter().find(|u| u.key == key)
    }

    /// ページ末尾までスクロールしたときのオフセット
    pub fn max_scroll(&self) -> f32 {
        self.viewport.max_scroll(self.content_height)
    }
}

/// ブロックをユニットの列（遅延付き）に展開する
fn expand_block(block: &Block) -> (RowLayout, Vec<(u32, UnitContent)>) {
    fn staggered<T, F>(items: &[T], stagger_ms: u32, f: F) -> Vec<(u32, UnitContent)>
    where
        F: Fn(usize, &T) -> UnitContent,
    {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| (i as u32 * stagger_ms, f(i, item)))
            .collect()
    }

    match block {
        Block::Hero {
            badge,
            headline,
            highlight,
            headline_tail,
            lead,
            cta_label,
            secondary,
            tags,
            portrait,
            portrait_delay_ms,
        } => (
            RowLayout::Grid(2),
            vec![
                (
                    0,
                    UnitContent::HeroText {
                        badge: badge.clone(),
                        headline: headline.clone(),
                        highlight: highlight.clone(),
                        headline_tail: headline_tail.clone(),
                        lead: lead.clone(),
                        cta_label: cta_label.clone(),
                        secondary: secondary.clone(),
                        tags: tags.clone(),
                    },
                ),
                (*portrait_delay_ms, UnitContent::Portrait(portrait.clone())),
            ],
        ),
        Block::Heading { eyebrow, title, subtitle } => (
            RowLayout::Stack,
            vec![(
                0,
                UnitContent::Heading {
                    eyebrow: eyebrow.clone(),
                    title: title.clone(),
                    subtitle: subtitle.clone(),
                },
            )],
        ),
        Block::Checklist { items, stagger_ms } => (
            RowLayout::Stack,
            staggered(items, *stagger_ms, |_, text| UnitContent::ChecklistItem(text.clone())),
        ),
        Block::Quote { text, delay_ms } => (
            RowLayout::Stack,
            vec![(*delay_ms, UnitContent::Quote(text.clone()))],
        ),
        Block::Cards { items, stagger_ms } => (
            RowLayout::Grid(3),
            staggered(items, *stagger_ms, |_, card| UnitContent::Card(card.clone())),
        ),
        Block::Profile {
            badge,
            title,
            paragraphs,
            image,
            cta_label,
        } => (
            RowLayout::Stack,
            vec![(
                0,
                UnitContent::Profile {
                    badge: badge.clone(),
                    title: title.clone(),
                    paragraphs: paragraphs.clone(),
                    image: image.clone(),
                    cta_label: cta_label.clone(),
                },
            )],
        ),
        Block::InfoGrid { items, stagger_ms } => (
            RowLayout::Grid(2),
            staggered(items, *stagger_ms, |_, item| UnitContent::InfoItem(item.clone())),
        ),
        Block::Note { title, text, delay_ms } => (
            RowLayout::Stack,
            vec![(
                *delay_ms,
                UnitContent::Note {
                    title: title.clone(),
                    text: text.clone(),
                },
            )],
        ),
        Block::Faq { items, stagger_ms } => (
            RowLayout::Stack,
            staggered(items, *stagger_ms, |index, item| UnitContent::FaqItem {
                index,
                item: item.clone(),
            }),
        ),
        Block::CallToAction { title, text, cta_label } => (
            RowLayout::Stack,
            vec![(
                0,
                UnitContent::CallToAction {
                    title: title.clone(),
                    text: text.clone(),
                    cta_label: cta_label.clone(),
                },
            )],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn default_page(width: f32) -> Page {
        let config = SiteConfig::embedded().unwrap();
        Page::compose(&config, Viewport::new(width, 800.0))
    }

    fn delays(page: &Page, prefix: &str) -> Vec<u32> {
        page.units
            .iter()
            .filter(|u| u.key.starts_with(prefix))
            .map(|u| u.delay_ms)
            .collect()
    }

    #[test]
    fn test_stagger_delays_follow_list_position() {
        let page = default_page(1280.0);

        assert_eq!(delays(&page, "quem-sou/check/"), vec![0, 100, 200, 300, 400]);
        assert_eq!(delays(&page, "quem-sou/quote/"), vec![300]);
        assert_eq!(delays(&page, "section-2/card/"), vec![0, 150, 300]);
        assert_eq!(delays(&page, "section-4/info/"), vec![0, 100, 200, 300]);
        assert_eq!(delays(&page, "section-4/note/"), vec![400]);
        assert_eq!(delays(&page, "faq/faq/"), vec![0, 100, 200, 300]);
        assert_eq!(delays(&page, "section-0/portrait/"), vec![200]);
    }

    #[test]
    fn test_unit_count_and_order() {
        let page = default_page(1280.0);
        assert_eq!(page.units.len(), 26);

        // ページ順に並び、セクション番号は単調増加
        let sections: Vec<usize> = page.units.iter().map(|u| u.section).collect();
        let mut sorted = sections.clone();
        sorted.sort();
        assert_eq!(sections, sorted);
    }

    #[test]
    fn test_sections_stack_without_overlap() {
        for width in [390.0, 1280.0] {
            let page = default_page(width);
            for pair in page.sections.windows(2) {
                assert!(pair[0].rect.bottom() <= pair[1].rect.top() + 0.01);
            }
            for unit in &page.units {
                let section = &page.sections[unit.section].rect;
                assert!(unit.rect.top() >= section.top(), "{}", unit.key);
                assert!(unit.rect.bottom() <= section.bottom(), "{}", unit.key);
                assert!(unit.rect.area() > 0.0, "{}", unit.key);
            }
            assert!(page.content_height > page.sections.last().unwrap().rect.bottom());
        }
    }

    #[test]
    fn test_grid_rows_share_top_on_wide_viewport() {
        let page = default_page(1280.0);
        let cards: Vec<&RevealUnit> = page
            .units
            .iter()
            .filter(|u| u.key.starts_with("section-2/card/"))
            .collect();
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().all(|c| c.rect.top() == cards[0].rect.top()));

        let narrow = default_page(390.0);
        let narrow_cards: Vec<&RevealUnit> = narrow
            .units
            .iter()
            .filter(|u| u.key.starts_with("section-2/card/"))
            .collect();
        assert!(narrow_cards[1].rect.top() > narrow_cards[0].rect.bottom());
    }

    #[test]
    fn test_split_section_places_columns_side_by_side() {
        let page = default_page(1280.0);
        let first_check = page.unit_by_key("quem-sou/check/0").unwrap();
        let quote = page.unit_by_key("quem-sou/quote/0").unwrap();
        assert_eq!(first_check.rect.top(), quote.rect.top());
        assert!(quote.rect.left() > first_check.rect.right());
    }

    #[test]
    fn test_section_offsets_resolve_nav_targets() {
        let config = SiteConfig::embedded().unwrap();
        let page = Page::compose(&config, Viewport::default());
        for link in &config.nav {
            assert!(page.section_offset(&link.target).is_some(), "{}", link.target);
        }
        assert!(page.section_offset("missing").is_none());
        assert!(page.section_offset("sobre").unwrap() > page.section_offset("quem-sou").unwrap());
    }
}
