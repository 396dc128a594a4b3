// IntersectionObserverを使ったウォッチャー（WASM環境）
//
// 同じオプションの登録は1つのIntersectionObserverで多重化する。
// 各アンカー要素には data-reveal-sub 属性でSubscription IDを付け、
// コールバックではその属性から通知先を引く。

use super::watcher::{IntersectionEntry, IntersectionWatcher, ObserveOptions, Subscription};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

const SUBSCRIPTION_ATTR: &str = "data-reveal-sub";

/// 交差通知を受け取るハンドラ
pub type EntryHandler = Rc<dyn Fn(Vec<IntersectionEntry>)>;

struct ObserverSlot {
    options: ObserveOptions,
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

pub struct DomWatcher {
    slots: Vec<ObserverSlot>,
    anchors: HashMap<Subscription, (usize, Element)>,
    next_id: u64,
    handler: EntryHandler,
}

impl DomWatcher {
    pub fn new(handler: EntryHandler) -> Self {
        Self {
            slots: Vec::new(),
            anchors: HashMap::new(),
            next_id: 0,
            handler,
        }
    }

    /// オプションに対応するObserverを取得（無ければ作成）
    fn slot_for(&mut self, options: &ObserveOptions) -> Option<usize> {
        if let Some(index) = self.slots.iter().position(|s| s.options == *options) {
            return Some(index);
        }

        let handler = Rc::clone(&self.handler);
        let threshold = options.threshold;
        let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _observer: IntersectionObserver| {
            let converted: Vec<IntersectionEntry> = entries
                .iter()
                .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
                .filter_map(|entry| {
                    let id = entry.target().get_attribute(SUBSCRIPTION_ATTR)?.parse::<u64>().ok()?;
                    let ratio = entry.intersection_ratio();
                    // isIntersectingは接触だけでもtrueになるので比率でも判定する
                    let qualifies = entry.is_intersecting() && (threshold <= 0.0 || ratio >= threshold);
                    Some(IntersectionEntry::new(Subscription(id), qualifies, ratio))
                })
                .collect();
            if !converted.is_empty() {
                handler(converted);
            }
        }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin.to_string());

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                log::debug!(
                    "IntersectionObserver created (threshold {}, rootMargin {})",
                    options.threshold,
                    options.root_margin
                );
                self.slots.push(ObserverSlot {
                    options: *options,
                    observer,
                    _callback: callback,
                });
                Some(self.slots.len() - 1)
            }
            Err(e) => {
                log::warn!("IntersectionObserver unavailable: {:?}", e);
                None
            }
        }
    }

    /// 全Observerを切断する（ページ破棄時）
    pub fn disconnect(&mut self) {
        for slot in &self.slots {
            slot.observer.disconnect();
        }
        for (_, element) in self.anchors.values() {
            let _ = element.remove_attribute(SUBSCRIPTION_ATTR);
        }
        self.anchors.clear();
        self.slots.clear();
    }
}

impl IntersectionWatcher for DomWatcher {
    type Anchor = Element;

    fn register(&mut self, anchor: &Element, options: &ObserveOptions) -> Option<Subscription> {
        let slot = self.slot_for(options)?;
        self.next_id += 1;
        let subscription = Subscription(self.next_id);

        anchor
            .set_attribute(SUBSCRIPTION_ATTR, &subscription.0.to_string())
            .ok()?;
        self.slots[slot].observer.observe(anchor);
        self.anchors.insert(subscription, (slot, anchor.clone()));
        Some(subscription)
    }

    fn deregister(&mut self, subscription: Subscription) {
        if let Some((slot, element)) = self.anchors.remove(&subscription) {
            if let Some(slot) = self.slots.get(slot) {
                slot.observer.unobserve(&element);
            }
            let _ = element.remove_attribute(SUBSCRIPTION_ATTR);
        }
    }

    fn is_registered(&self, subscription: Subscription) -> bool {
        self.anchors.contains_key(&subscription)
    }

    fn active_registrations(&self) -> usize {
        self.anchors.len()
    }
}

impl Drop for DomWatcher {
    fn drop(&mut self) {
        self.disconnect();
    }
}
