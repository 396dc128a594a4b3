/// 表示状態から見た目（不透明度・縦方向オフセット）を導出する
///
/// コントローラ自身はアニメーションしない。ここにあるのは
/// (visible, delay_ms, 経過時間) の純粋関数と、ブラウザに補間させるためのCSS出力のみ。

/// デフォルトのトランジション時間
pub const DEFAULT_DURATION_MS: u32 = 1000;

/// 非表示時の縦方向オフセット（3rem）
pub const DEFAULT_DISPLACEMENT_PX: f32 = 48.0;

/// イージング関数
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// CSSの ease-out 相当（cubic-bezier(0, 0, 0.2, 1)）
    EaseOut,
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    fn control_points(&self) -> Option<(f32, f32, f32, f32)> {
        match self {
            Easing::Linear => None,
            Easing::EaseOut => Some((0.0, 0.0, 0.2, 1.0)),
            Easing::CubicBezier(x1, y1, x2, y2) => Some((*x1, *y1, *x2, *y2)),
        }
    }

    /// 進行度 t (0..1) に対する補間値
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let Some((x1, y1, x2, y2)) = self.control_points() else {
            return t;
        };
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let s = solve_bezier_parameter(t, x1, x2);
        bezier(s, y1, y2)
    }

    pub fn css(&self) -> String {
        match self {
            Easing::Linear => "linear".to_string(),
            Easing::EaseOut => "cubic-bezier(0, 0, 0.2, 1)".to_string(),
            Easing::CubicBezier(x1, y1, x2, y2) => {
                format!("cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        }
    }
}

// 1次元の3次ベジェ (P0 = 0, P3 = 1)
fn bezier(s: f32, p1: f32, p2: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_derivative(s: f32, p1: f32, p2: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

// x(s) = x となる s を求める（ニュートン法、収束しなければ二分法）
fn solve_bezier_parameter(x: f32, x1: f32, x2: f32) -> f32 {
    let mut s = x;
    for _ in 0..8 {
        if !(0.0..=1.0).contains(&s) {
            break;
        }
        let err = bezier(s, x1, x2) - x;
        if err.abs() < 1e-5 {
            return s;
        }
        let d = bezier_derivative(s, x1, x2);
        if d.abs() < 1e-6 {
            break;
        }
        s -= err / d;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..32 {
        let value = bezier(s, x1, x2);
        if (value - x).abs() < 1e-5 {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

/// ある時点での見た目
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub opacity: f32,
    pub translate_y: f32,
}

impl Frame {
    pub fn css(&self) -> String {
        format!(
            "opacity: {}; transform: translateY({}px);",
            round3(self.opacity),
            round3(self.translate_y)
        )
    }
}

fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

/// 表示トランジションの設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealTransition {
    pub duration_ms: u32,
    pub displacement_px: f32,
    pub easing: Easing,
}

impl Default for RevealTransition {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            displacement_px: DEFAULT_DISPLACEMENT_PX,
            easing: Easing::EaseOut,
        }
    }
}

impl RevealTransition {
    pub fn hidden_frame(&self) -> Frame {
        Frame {
            opacity: 0.0,
            translate_y: self.displacement_px,
        }
    }

    pub fn revealed_frame(&self) -> Frame {
        Frame {
            opacity: 1.0,
            translate_y: 0.0,
        }
    }

    /// 表示判定からの経過時間に対する進行度（遅延中は0）
    pub fn progress(&self, delay_ms: u32, elapsed_ms: f64) -> f32 {
        let active = elapsed_ms - delay_ms as f64;
        if active <= 0.0 {
            return 0.0;
        }
        if self.duration_ms == 0 {
            return 1.0;
        }
        (active / self.duration_ms as f64).min(1.0) as f32
    }

    /// (visible, delay, 経過時間) から見た目を求める
    pub fn sample(&self, visible: bool, delay_ms: u32, elapsed_ms: f64) -> Frame {
        if !visible {
            return self.hidden_frame();
        }
        let eased = self.easing.apply(self.progress(delay_ms, elapsed_ms));
        Frame {
            opacity: eased,
            translate_y: self.displacement_px * (1.0 - eased),
        }
    }

    /// トランジションが完了する経過時間
    pub fn settle_ms(&self, delay_ms: u32) -> f64 {
        delay_ms as f64 + self.duration_ms as f64
    }

    /// ブラウザに補間させるためのインラインスタイル
    pub fn css(&self, visible: bool, delay_ms: u32) -> String {
        let frame = if visible {
            self.revealed_frame()
        } else {
            self.hidden_frame()
        };
        format!(
            "{} transition-property: opacity, transform; transition-duration: {}ms; transition-timing-function: {}; transition-delay: {}ms;",
            frame.css(),
            self.duration_ms,
            self.easing.css(),
            delay_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_is_transparent_and_offset() {
        let transition = RevealTransition::default();
        let frame = transition.sample(false, 0, 5000.0);
        assert_eq!(frame.opacity, 0.0);
        assert_eq!(frame.translate_y, 48.0);
    }

    #[test]
    fn test_delay_holds_start_frame() {
        let transition = RevealTransition::default();
        // T+149ms まではまだ動かない
        for elapsed in [0.0, 50.0, 149.0, 150.0] {
            let frame = transition.sample(true, 150, elapsed);
            assert_eq!(frame.opacity, 0.0, "elapsed {}", elapsed);
            assert_eq!(frame.translate_y, 48.0);
        }
        assert!(transition.sample(true, 150, 151.0).opacity > 0.0);
    }

    #[test]
    fn test_transition_completes_within_duration() {
        let transition = RevealTransition::default();
        assert_eq!(transition.settle_ms(150), 1150.0);

        let done = transition.sample(true, 150, 1150.0);
        assert_eq!(done.opacity, 1.0);
        assert_eq!(done.translate_y, 0.0);

        let later = transition.sample(true, 150, 99_999.0);
        assert_eq!(later, transition.revealed_frame());
    }

    #[test]
    fn test_ease_out_is_monotonic_and_front_loaded() {
        let mut prev = 0.0;
        for i in 1..=20 {
            let v = Easing::EaseOut.apply(i as f32 / 20.0);
            assert!(v >= prev);
            prev = v;
        }
        // ease-out は中間地点で線形より先行する
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let transition = RevealTransition {
            duration_ms: 0,
            ..Default::default()
        };
        assert_eq!(transition.sample(true, 0, 0.5).opacity, 1.0);
    }

    #[test]
    fn test_css_carries_delay() {
        let transition = RevealTransition::default();
        let hidden = transition.css(false, 200);
        assert!(hidden.starts_with("opacity: 0; transform: translateY(48px);"));
        assert!(hidden.contains("transition-delay: 200ms;"));
        assert!(hidden.contains("cubic-bezier(0, 0, 0.2, 1)"));

        let shown = transition.css(true, 200);
        assert!(shown.starts_with("opacity: 1; transform: translateY(0px);"));
    }
}
