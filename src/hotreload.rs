use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use log::{error, info};

type ReloadCallback = Arc<Mutex<Option<Box<dyn Fn() + Send + 'static>>>>;

/// サイト記述ファイルを監視し、変更時にコールバックを呼ぶ
pub struct HotReloader {
    _watcher: RecommendedWatcher,
    reload_callback: ReloadCallback,
}

impl HotReloader {
    /// 新しいホットリローダーを作成（ファイルの親ディレクトリを監視する）
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let target = config_path.as_ref().to_path_buf();
        let watch_dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (tx, rx): (Sender<notify::Result<Event>>, Receiver<notify::Result<Event>>) = mpsc::channel();

        let config = Config::default().with_poll_interval(Duration::from_millis(100));

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Error sending watch event: {}", e);
                }
            },
            config,
        )?;

        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        info!("🔥 Watching site description: {}", target.display());

        let reload_callback: ReloadCallback = Arc::new(Mutex::new(None));

        // ファイル監視を別スレッドで開始
        let callback_clone = Arc::clone(&reload_callback);
        thread::spawn(move || {
            loop {
                match rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(Ok(event)) => {
                        if should_reload(&event, &target) {
                            info!("🔄 {} changed, re-rendering...", target.display());

                            // 書き込み完了を待つ
                            thread::sleep(Duration::from_millis(100));
                            // 保存時に連続して届く通知を捨てる
                            while rx.try_recv().is_ok() {}

                            if let Ok(callback_guard) = callback_clone.lock() {
                                if let Some(ref cb) = *callback_guard {
                                    cb();
                                }
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        error!("Watch error: {:?}", e);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        error!("Watcher disconnected");
                        break;
                    }
                }
            }
        });

        Ok(HotReloader {
            _watcher: watcher,
            reload_callback,
        })
    }

    /// リロード時のコールバック関数を設定
    pub fn set_reload_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + 'static,
    {
        if let Ok(mut cb) = self.reload_callback.lock() {
            *cb = Some(Box::new(callback));
        }
    }
}

/// 監視対象ファイルへの変更・作成イベントのみリロード対象
fn should_reload(event: &Event, target: &Path) -> bool {
    use notify::EventKind;

    match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) => event
            .paths
            .iter()
            .any(|path| path.file_name().is_some() && path.file_name() == target.file_name()),
        _ => false,
    }
}
