use crate::reveal::geometry::Rect;
use crate::reveal::watcher::RootMargin;

/// md ブレークポイント（これ以上の幅で横並びレイアウト）
pub const MD_BREAKPOINT: f32 = 768.0;

/// スクロール位置とサイズで表したビューポート
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_offset: [f32; 2],
    pub size: [f32; 2],
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            scroll_offset: [0.0, 0.0],
            size: [width, height],
        }
    }

    /// "1280x800" 形式をパース
    pub fn parse_size(source: &str) -> Result<Self, String> {
        let (w, h) = source
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid viewport '{}', expected WIDTHxHEIGHT", source))?;
        let width: f32 = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid viewport width '{}'", w))?;
        let height: f32 = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid viewport height '{}'", h))?;
        if width <= 0.0 || height <= 0.0 {
            return Err(format!("viewport '{}' must be positive", source));
        }
        Ok(Self::new(width, height))
    }

    pub fn scrolled_to(&self, y: f32) -> Self {
        Self {
            scroll_offset: [self.scroll_offset[0], y.max(0.0)],
            size: self.size,
        }
    }

    pub fn is_wide(&self) -> bool {
        self.size[0] >= MD_BREAKPOINT
    }

    /// ドキュメント座標系での可視領域
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.scroll_offset[0],
            self.scroll_offset[1],
            self.size[0],
            self.size[1],
        )
    }

    /// ルートマージン適用後の観測ルート
    pub fn root(&self, margin: &RootMargin) -> Rect {
        self.rect().expand(margin)
    }

    /// ドキュメント末尾までスクロールしたときのオフセット
    pub fn max_scroll(&self, content_height: f32) -> f32 {
        (content_height - self.size[1]).max(0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}
