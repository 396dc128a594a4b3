use crate::site::config::SiteConfig;
use crate::site::page::{NAV_HEIGHT, MAX_CONTENT_WIDTH, Page, Row, RowLayout, UnitContent};
use crate::site::ui_state::UiState;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

/// 表示演出ユニットに付ける属性（値はユニット番号）
pub const REVEAL_ATTR: &str = "data-reveal";
/// FAQの回答要素に付ける属性（値はFAQ番号）
pub const FAQ_ANSWER_ATTR: &str = "data-faq-answer";
pub const MOBILE_MENU_ID: &str = "mobile-menu";

/// DOMレンダラ
/// 構成済みページをHTMLとして組み立て、コンテナ要素へ流し込む
pub struct DomRenderer {
    /// レンダリングターゲットとなるコンテナ要素のID
    container_id: String,
    /// ページタイトル（ネイティブ出力用）
    title: String,
    /// HTML要素のバッファ
    html_buffer: Vec<String>,
}

impl DomRenderer {
    /// 新しいDOMレンダラを作成
    pub fn new() -> Self {
        Self::with_container("container")
    }

    /// 指定されたコンテナIDで新しいDOMレンダラを作成
    pub fn with_container(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            title: String::new(),
            html_buffer: Vec::new(),
        }
    }

    /// ページ全体を描画
    /// styles はユニットごとのインラインスタイル（page.units と同じ順）
    pub fn render_page(&mut self, config: &SiteConfig, page: &Page, ui: &UiState, styles: &[String]) {
        self.clear_container();
        self.title = config.title.clone();

        self.html_buffer.push(format!("<style>{}</style>", stylesheet()));
        self.render_nav(config, ui);

        self.html_buffer.push("<main>".to_string());
        for section in &page.sections {
            let id_attr = section
                .id
                .as_ref()
                .map(|id| format!(r#" id="{}""#, escape(id)))
                .unwrap_or_default();
            let class = if section.split { "section split" } else { "section" };
            self.html_buffer.push(format!(
                r#"<section{} class="{}" style="background-color: {};"><div class="inner">"#,
                id_attr,
                class,
                escape(&section.theme)
            ));
            for row in &section.rows {
                self.render_row(config, page, ui, row, styles);
            }
            self.html_buffer.push("</div></section>".to_string());
        }
        self.html_buffer.push("</main>".to_string());

        self.render_footer(config);
        log::debug!(
            "DOM rendered {} units into #{}",
            page.units.len(),
            self.container_id
        );
    }

    /// コンテナをクリア
    fn clear_container(&mut self) {
        self.html_buffer.clear();
        log::trace!("DOM clear container: {}", self.container_id);
    }

    fn render_nav(&mut self, config: &SiteConfig, ui: &UiState) {
        let links: String = config
            .nav
            .iter()
            .map(|link| {
                format!(
                    r#"<button type="button" data-action="section:{}">{}</button>"#,
                    escape(&link.target),
                    escape(&link.label)
                )
            })
            .collect();
        let contact = &config.contact;
        let mobile_label = contact.mobile_label.as_deref().unwrap_or(&contact.label);
        let hidden = if ui.nav.menu_open { "" } else { " hidden" };

        self.html_buffer.push(format!(
            r#"<nav class="nav"><div class="inner nav-bar"><div class="brand"><span class="initial">{}</span><span class="name">{}</span><span class="tagline">{}</span></div><div class="nav-links">{}{}</div><button type="button" class="menu-toggle" data-action="menu" aria-expanded="{}">☰</button></div><div id="{}" class="mobile-menu"{}>{}{}</div></nav>"#,
            escape(&config.brand.initial),
            escape(&config.brand.name),
            escape(&config.brand.tagline),
            links,
            contact_link(&contact.url, &contact.label, "button"),
            ui.nav.menu_open,
            MOBILE_MENU_ID,
            hidden,
            links,
            contact_link(&contact.url, mobile_label, "button wide"),
        ));
    }

    fn render_row(&mut self, config: &SiteConfig, page: &Page, ui: &UiState, row: &Row, styles: &[String]) {
        let class = match row.layout {
            RowLayout::Stack => "row stack".to_string(),
            RowLayout::Grid(n) => format!("row grid cols-{}", n),
        };
        self.html_buffer.push(format!(r#"<div class="{}">"#, class));
        for &index in &row.units {
            let unit = &page.units[index];
            let style = styles.get(index).map(String::as_str).unwrap_or("");
            let body = self.render_unit(config, ui, &unit.content);
            self.html_buffer.push(format!(
                r#"<div class="reveal {}" {}="{}" data-key="{}" style="{}">{}</div>"#,
                unit.content.kind(),
                REVEAL_ATTR,
                index,
                escape(&unit.key),
                escape(style),
                body
            ));
        }
        self.html_buffer.push("</div>".to_string());
    }

    /// ユニットの中身を描画
    fn render_unit(&self, config: &SiteConfig, ui: &UiState, content: &UnitContent) -> String {
        let contact = &config.contact;
        match content {
            UnitContent::HeroText {
                badge,
                headline,
                highlight,
                headline_tail,
                lead,
                cta_label,
                secondary,
                tags,
            } => {
                let tags: String = tags
                    .iter()
                    .map(|t| format!(r#"<span class="tag">{}</span>"#, escape(t)))
                    .collect();
                format!(
                    r#"<span class="badge">{}</span><h1>{} <em>{}</em> {}</h1><p class="lead">{}</p><div class="actions">{}<button type="button" class="button ghost" data-action="section:{}">{}</button></div><div class="tags">{}</div>"#,
                    escape(badge),
                    escape(headline),
                    escape(highlight),
                    escape(headline_tail),
                    escape(lead),
                    contact_link(&contact.url, cta_label, "button"),
                    escape(&secondary.target),
                    escape(&secondary.label),
                    tags
                )
            }
            UnitContent::Portrait(image) => {
                let caption = image
                    .caption
                    .as_ref()
                    .map(|c| format!("<figcaption>{}</figcaption>", escape(c)))
                    .unwrap_or_default();
                format!(
                    r#"<figure class="portrait"><img src="{}" alt="{}" />{}</figure>"#,
                    escape(&image.src),
                    escape(&image.alt),
                    caption
                )
            }
            UnitContent::Heading { eyebrow, title, subtitle } => {
                let eyebrow = eyebrow
                    .as_ref()
                    .map(|e| format!(r#"<span class="eyebrow">{}</span>"#, escape(e)))
                    .unwrap_or_default();
                let subtitle = subtitle
                    .as_ref()
                    .map(|s| format!("<p>{}</p>", escape(s)))
                    .unwrap_or_default();
                format!("{}<h2>{}</h2>{}", eyebrow, escape(title), subtitle)
            }
            UnitContent::ChecklistItem(text) => {
                format!(r#"<span class="check">✓</span><p>{}</p>"#, escape(text))
            }
            UnitContent::Quote(text) => format!("<blockquote>{}</blockquote>", escape(text)),
            UnitContent::Card(card) => {
                let accent = card.accent.as_deref().unwrap_or("#4D6BD9");
                format!(
                    r#"<div class="icon" data-icon="{}" style="background-color: {};"></div><h3>{}</h3><p>{}</p>"#,
                    escape(&card.icon),
                    escape(accent),
                    escape(&card.title),
                    escape(&card.text)
                )
            }
            UnitContent::Profile {
                badge,
                title,
                paragraphs,
                image,
                cta_label,
            } => {
                let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", escape(p))).collect();
                format!(
                    r#"<img class="avatar" src="{}" alt="{}" /><div><span class="badge">{}</span><h2>{}</h2>{}{}</div>"#,
                    escape(&image.src),
                    escape(&image.alt),
                    escape(badge),
                    escape(title),
                    body,
                    contact_link(&contact.url, cta_label, "button")
                )
            }
            UnitContent::InfoItem(item) => format!(
                r#"<div class="icon" data-icon="{}"></div><div><h4>{}</h4><p>{}</p></div>"#,
                escape(&item.icon),
                escape(&item.title),
                escape(&item.text)
            ),
            UnitContent::Note { title, text } => {
                format!("<h4>{}</h4><p>{}</p>", escape(title), escape(text))
            }
            UnitContent::FaqItem { index, item } => {
                let open = ui.faq.is_open(*index);
                format!(
                    r#"<button type="button" class="question" data-action="faq:{}" aria-expanded="{}">{}<span class="chevron">⌄</span></button><div class="answer" {}="{}"{}>{}</div>"#,
                    index,
                    open,
                    escape(&item.question),
                    FAQ_ANSWER_ATTR,
                    index,
                    if open { "" } else { " hidden" },
                    escape(&item.answer)
                )
            }
            UnitContent::CallToAction { title, text, cta_label } => format!(
                "<h2>{}</h2><p>{}</p>{}",
                escape(title),
                escape(text),
                contact_link(&contact.url, cta_label, "button light")
            ),
        }
    }

    fn render_footer(&mut self, config: &SiteConfig) {
        let links: String = config
            .footer
            .links
            .iter()
            .map(|l| format!(r#"<a href="{}">{}</a>"#, escape(&l.href), escape(&l.label)))
            .collect();
        self.html_buffer.push(format!(
            r#"<footer><div class="inner"><span class="name">{}</span><div class="links">{}</div><p>{}</p></div></footer>"#,
            escape(&config.brand.name),
            links,
            escape(&config.footer.copyright)
        ));
    }

    /// コンテナ内に入るHTML断片
    pub fn html(&self) -> String {
        self.html_buffer.join("\n")
    }

    /// コンテナIDを取得
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// コンテナ要素へHTMLを流し込む
    #[cfg(target_arch = "wasm32")]
    pub fn mount(&self) -> Result<(), String> {
        let container = self.container()?;
        container.set_inner_html(&self.html());
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn container(&self) -> Result<web_sys::Element, String> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| "document is not available".to_string())?;
        document
            .get_element_by_id(&self.container_id)
            .ok_or_else(|| format!("container #{} not found", self.container_id))
    }

    /// ユニット番号に対応するアンカー要素
    #[cfg(target_arch = "wasm32")]
    pub fn anchor(&self, index: usize) -> Option<web_sys::Element> {
        let container = self.container().ok()?;
        container
            .query_selector(&format!("[{}=\"{}\"]", REVEAL_ATTR, index))
            .ok()
            .flatten()
    }

    /// 再描画せずにユニットのスタイルだけ差し替える
    #[cfg(target_arch = "wasm32")]
    pub fn apply_style(&self, anchor: &web_sys::Element, css: &str) {
        if let Some(element) = anchor.dyn_ref::<web_sys::HtmlElement>() {
            element.style().set_css_text(css);
        }
    }

    /// メニューとFAQの開閉状態をDOMへ反映する
    #[cfg(target_arch = "wasm32")]
    pub fn sync_ui(&self, ui: &UiState, faq_count: usize) {
        let Ok(container) = self.container() else {
            return;
        };
        let find = |selector: String| container.query_selector(&selector).ok().flatten();

        if let Some(menu) = find(format!("#{}", MOBILE_MENU_ID)) {
            let _ = menu.toggle_attribute_with_force("hidden", !ui.nav.menu_open);
        }
        if let Some(toggle) = find("[data-action=\"menu\"]".to_string()) {
            let _ = toggle.set_attribute("aria-expanded", &ui.nav.menu_open.to_string());
        }
        for index in 0..faq_count {
            let open = ui.faq.is_open(index);
            if let Some(answer) = find(format!("[{}=\"{}\"]", FAQ_ANSWER_ATTR, index)) {
                let _ = answer.toggle_attribute_with_force("hidden", !open);
            }
            if let Some(question) = find(format!("[data-action=\"faq:{}\"]", index)) {
                let _ = question.set_attribute("aria-expanded", &open.to_string());
            }
        }
    }

    /// ネイティブ環境でHTMLを取得
    #[cfg(not(target_arch = "wasm32"))]
    pub fn get_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
</head>
<body>
    <div id="{}">
{}
    </div>
</body>
</html>"#,
            escape(&self.title),
            self.container_id,
            self.html()
        )
    }

    /// ネイティブ環境でHTMLファイルに保存
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::Write;

        let mut file = File::create(path)?;
        file.write_all(self.get_html().as_bytes())?;
        log::info!("HTMLファイルを保存しました: {}", path);
        Ok(())
    }
}

impl Default for DomRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn contact_link(url: &str, label: &str, class: &str) -> String {
    format!(
        r#"<a class="{}" href="{}" target="_blank" rel="noopener noreferrer" data-action="contact">{}</a>"#,
        class,
        escape(url),
        escape(label)
    )
}

fn stylesheet() -> String {
    format!(
        "body {{ margin: 0; font-family: sans-serif; color: #1f2937; }} \
         .nav {{ position: fixed; top: 0; left: 0; right: 0; z-index: 50; background: rgba(255,255,255,0.9); }} \
         .nav-bar {{ height: {nav}px; display: flex; align-items: center; justify-content: space-between; }} \
         .inner {{ max-width: {max}px; margin: 0 auto; padding: 0 16px; }} \
         .section {{ padding: 80px 0; scroll-margin-top: {nav}px; }} \
         .section:first-child {{ padding-top: 160px; }} \
         .row {{ margin-bottom: 48px; }} \
         .stack > * + * {{ margin-top: 16px; }} \
         .grid {{ display: grid; gap: 24px; }} \
         .mobile-menu {{ display: flex; flex-direction: column; padding: 16px; }} \
         .mobile-menu[hidden] {{ display: none; }} \
         .menu-toggle {{ display: none; }} \
         .reveal {{ will-change: opacity, transform; }} \
         @media (min-width: 768px) {{ \
           .cols-2 {{ grid-template-columns: repeat(2, 1fr); }} \
           .cols-3 {{ grid-template-columns: repeat(3, 1fr); }} \
           .split .inner {{ display: grid; grid-template-columns: 1fr 1fr; column-gap: 24px; }} \
           .split .inner > .row:first-child {{ grid-column: 1 / -1; }} \
           .mobile-menu {{ display: none; }} \
         }} \
         @media (max-width: 767px) {{ .nav-links {{ display: none; }} .menu-toggle {{ display: block; }} }}",
        nav = NAV_HEIGHT,
        max = MAX_CONTENT_WIDTH
    )
}

/// HTML特殊文字のエスケープ
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
