use super::watcher::RootMargin;

/// ドキュメント座標系の矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: [f32; 2],
    pub size: [f32; 2],
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: [x, y],
            size: [width.max(0.0), height.max(0.0)],
        }
    }

    pub fn left(&self) -> f32 {
        self.position[0]
    }

    pub fn top(&self) -> f32 {
        self.position[1]
    }

    pub fn right(&self) -> f32 {
        self.position[0] + self.size[0]
    }

    pub fn bottom(&self) -> f32 {
        self.position[1] + self.size[1]
    }

    pub fn area(&self) -> f32 {
        self.size[0] * self.size[1]
    }

    /// 交差領域。辺が接しているだけの場合は面積0の矩形を返す
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// ルートマージンを適用した矩形（%の上下は高さ、左右は幅が基準）
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        let top = margin.top.resolve(self.size[1]);
        let bottom = margin.bottom.resolve(self.size[1]);
        let left = margin.left.resolve(self.size[0]);
        let right = margin.right.resolve(self.size[0]);

        Rect::new(
            self.left() - left,
            self.top() - top,
            self.size[0] + left + right,
            self.size[1] + top + bottom,
        )
    }
}

/// 交差の観測結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionSample {
    /// 接触も含めて交差しているか
    pub touching: bool,
    /// ターゲット面積に対する交差面積の比率
    pub ratio: f64,
}

/// ターゲットがルート内に入っている比率を計算
pub fn intersection_sample(target: &Rect, root: &Rect) -> IntersectionSample {
    match target.intersection(root) {
        None => IntersectionSample {
            touching: false,
            ratio: 0.0,
        },
        Some(overlap) => {
            let target_area = target.area();
            // 面積0のターゲットは接触していれば全体が見えているとみなす
            let ratio = if target_area <= 0.0 {
                1.0
            } else {
                (overlap.area() / target_area) as f64
            };
            IntersectionSample {
                touching: true,
                ratio: ratio.clamp(0.0, 1.0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_partial_overlap() {
        let root = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let target = Rect::new(0.0, 700.0, 1000.0, 200.0);
        let sample = intersection_sample(&target, &root);
        assert!(sample.touching);
        assert!((sample.ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_outside_is_not_touching() {
        let root = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let target = Rect::new(0.0, 900.0, 1000.0, 200.0);
        let sample = intersection_sample(&target, &root);
        assert!(!sample.touching);
        assert_eq!(sample.ratio, 0.0);
    }

    #[test]
    fn test_negative_bottom_margin_shrinks_root() {
        let viewport = Rect::new(0.0, 100.0, 1000.0, 800.0);
        let root = viewport.expand(&RootMargin::default());
        assert_eq!(root.top(), 100.0);
        assert_eq!(root.bottom(), 850.0);
        assert_eq!(root.size[0], 1000.0);
    }

    #[test]
    fn test_edge_adjacent_zero_area() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let line = Rect::new(10.0, 100.0, 50.0, 0.0);
        let sample = intersection_sample(&line, &root);
        assert!(sample.touching);
        assert_eq!(sample.ratio, 1.0);
    }
}
