// ========================================
// ビューポート交差監視の抽象化
// ========================================
//
// ブラウザのIntersectionObserverに相当する外部機能を最小限のインターフェースで表現する。
// - register(anchor, options) -> Subscription
// - deregister(subscription)
// - 交差通知は IntersectionEntry としてホストに届き、ホストが該当コントローラへ渡す

use regex::Regex;
use std::fmt;

/// デフォルトの交差しきい値（アンカー面積の10%）
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// デフォルトのルートマージン（下端を50px縮めて少し手前で発火させる）
pub const DEFAULT_ROOT_MARGIN: &str = "0px 0px -50px 0px";

lazy_static::lazy_static! {
    // "-50px" / "10%" / "0" のような単一トークン
    static ref MARGIN_TOKEN: Regex =
        Regex::new(r"^(-?(?:\d+(?:\.\d*)?|\.\d+))(px|%)?$").expect("valid margin token regex");
}

/// 登録ごとに発行されるハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(pub u64);

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// ウォッチャーからの1件の交差通知
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub subscription: Subscription,
    /// 設定したしきい値を満たして交差しているか
    pub is_intersecting: bool,
    /// 観測時点での交差比率（0.0 - 1.0）
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn new(subscription: Subscription, is_intersecting: bool, ratio: f64) -> Self {
        Self {
            subscription,
            is_intersecting,
            ratio,
        }
    }
}

/// マージン値（pxまたはルートサイズに対する%）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    Px(f32),
    Percent(f32),
}

impl MarginValue {
    /// 基準長（ルートの幅または高さ）に対してpxへ解決
    pub fn resolve(&self, basis: f32) -> f32 {
        match self {
            MarginValue::Px(v) => *v,
            MarginValue::Percent(p) => basis * p / 100.0,
        }
    }

    fn parse(token: &str) -> Result<Self, String> {
        let caps = MARGIN_TOKEN
            .captures(token)
            .ok_or_else(|| format!("invalid root margin value '{}'", token))?;
        let number: f32 = caps[1]
            .parse()
            .map_err(|e| format!("invalid root margin number '{}': {}", &caps[1], e))?;
        match caps.get(2).map(|m| m.as_str()) {
            Some("%") => Ok(MarginValue::Percent(number)),
            Some(_) => Ok(MarginValue::Px(number)),
            // 単位なしは0のみ許可（CSSと同じ）
            None if number == 0.0 => Ok(MarginValue::Px(0.0)),
            None => Err(format!("root margin value '{}' needs a px or % unit", token)),
        }
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Px(v) => write!(f, "{}px", v),
            MarginValue::Percent(p) => write!(f, "{}%", p),
        }
    }
}

/// 観測ルートに適用するマージン（CSSのmarginと同じ top, right, bottom, left の順）
/// 正の値はルートを広げ、負の値は縮める
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    pub fn zero() -> Self {
        Self {
            top: MarginValue::Px(0.0),
            right: MarginValue::Px(0.0),
            bottom: MarginValue::Px(0.0),
            left: MarginValue::Px(0.0),
        }
    }

    /// CSSのショートハンド記法（1〜4値）をパース
    pub fn parse(source: &str) -> Result<Self, String> {
        let values = source
            .split_whitespace()
            .map(MarginValue::parse)
            .collect::<Result<Vec<_>, String>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            [] => return Err("root margin is empty".to_string()),
            _ => {
                return Err(format!(
                    "root margin '{}' has {} values, expected 1 to 4",
                    source,
                    values.len()
                ));
            }
        };

        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        // DEFAULT_ROOT_MARGIN と同じ値
        Self {
            bottom: MarginValue::Px(-50.0),
            ..Self::zero()
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// ウォッチャーへの登録オプション
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    pub threshold: f64,
    pub root_margin: RootMargin,
}

impl ObserveOptions {
    pub fn new(threshold: f64, root_margin: RootMargin) -> Self {
        Self {
            threshold,
            root_margin,
        }
    }

    /// 比率がしきい値を満たしているか
    /// しきい値0の場合は少しでも交差していれば満たす
    pub fn qualifies(&self, ratio: f64, touching: bool) -> bool {
        if self.threshold <= 0.0 {
            touching
        } else {
            touching && ratio >= self.threshold
        }
    }
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
        }
    }
}

/// ビューポート交差ウォッチャー
///
/// 1つのウォッチャーが複数のアンカーを多重化してもよいし、アンカーごとに
/// 個別のウォッチャーを持ってもよい。どちらの場合でも、登録1件ごとに
/// 独立したSubscriptionが発行され、解除は何度呼んでも安全でなければならない。
pub trait IntersectionWatcher {
    /// 観測対象の領域を指すハンドル
    type Anchor;

    /// アンカーを登録する。登録できない場合はNone
    fn register(&mut self, anchor: &Self::Anchor, options: &ObserveOptions) -> Option<Subscription>;

    /// 登録を解除する（冪等）
    fn deregister(&mut self, subscription: Subscription);

    fn is_registered(&self, subscription: Subscription) -> bool;

    /// 現在有効な登録数
    fn active_registrations(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_margin_shrinks_bottom() {
        let margin = RootMargin::default();
        assert_eq!(margin.top, MarginValue::Px(0.0));
        assert_eq!(margin.right, MarginValue::Px(0.0));
        assert_eq!(margin.bottom, MarginValue::Px(-50.0));
        assert_eq!(margin.left, MarginValue::Px(0.0));
        assert_eq!(margin.to_string(), "0px 0px -50px 0px");
        assert_eq!(RootMargin::parse(DEFAULT_ROOT_MARGIN), Ok(margin));
    }

    #[test]
    fn test_margin_shorthand_forms() {
        let one = RootMargin::parse("10px").unwrap();
        assert_eq!(one.left, MarginValue::Px(10.0));

        let two = RootMargin::parse("5% 0px").unwrap();
        assert_eq!(two.top, MarginValue::Percent(5.0));
        assert_eq!(two.bottom, MarginValue::Percent(5.0));
        assert_eq!(two.right, MarginValue::Px(0.0));

        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(three.left, MarginValue::Px(2.0));
        assert_eq!(three.bottom, MarginValue::Px(3.0));

        let zero = RootMargin::parse("0").unwrap();
        assert_eq!(zero, RootMargin::zero());
    }

    #[test]
    fn test_margin_rejects_bad_input() {
        assert!(RootMargin::parse("").is_err());
        assert!(RootMargin::parse("10em").is_err());
        assert!(RootMargin::parse("12").is_err());
        assert!(RootMargin::parse("1px 1px 1px 1px 1px").is_err());
    }

    #[test]
    fn test_percent_resolves_against_basis() {
        assert_eq!(MarginValue::Percent(-20.0).resolve(500.0), -100.0);
        assert_eq!(MarginValue::Px(-50.0).resolve(500.0), -50.0);
    }

    #[test]
    fn test_threshold_qualification() {
        let options = ObserveOptions::default();
        assert!(!options.qualifies(0.05, true));
        assert!(options.qualifies(0.1, true));
        assert!(!options.qualifies(0.5, false));

        let any = ObserveOptions::new(0.0, RootMargin::zero());
        assert!(any.qualifies(0.0, true));
        assert!(!any.qualifies(0.0, false));
    }
}
