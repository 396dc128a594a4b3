// WASM専用のエントリーポイント

use crate::engine::runtime_dom::{DomSession, run_dom};
use crate::site::SiteConfig;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

thread_local! {
    // マウント中のページ（ページが生きている間保持する）
    static SITE: RefCell<Option<DomSession>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() {
    // パニック時のエラーメッセージをブラウザコンソールに表示
    console_error_panic_hook::set_once();

    // WebAssembly用のロガーを初期化
    // 再初期化は失敗するだけなので無視する
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("Luna site WASM starting...");

    if let Err(e) = mount_site("container") {
        log::error!("failed to mount site: {:?}", e);
    }
}

/// 埋め込みのサイト記述をコンテナへマウントする（既存のページは先にアンマウント）
#[wasm_bindgen]
pub fn mount_site(container_id: &str) -> Result<(), JsValue> {
    unmount_site();
    let config = SiteConfig::embedded().map_err(|e| JsValue::from_str(&e))?;
    let session = run_dom(config, container_id).map_err(|e| JsValue::from_str(&e))?;
    SITE.with(|site| *site.borrow_mut() = Some(session));
    Ok(())
}

/// ページを破棄して全ての観測を解除する（冪等）
#[wasm_bindgen]
pub fn unmount_site() {
    let session = SITE.with(|site| site.borrow_mut().take());
    if let Some(mut session) = session {
        session.unmount();
        log::info!("site unmounted");
    }
}

#[wasm_bindgen]
pub fn revealed_count() -> usize {
    SITE.with(|site| site.borrow().as_ref().map_or(0, |s| s.revealed_count()))
}
