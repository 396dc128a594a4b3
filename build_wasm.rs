use std::fs;
use std::path::Path;
use std::process::Command;

const JS_NAME: &str = "luna_site.js";
const WASM_NAME: &str = "luna_site_bg.wasm";

fn main() {
    if let Err(e) = build() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn build() -> Result<(), String> {
    println!("🚀 Building Luna site WASM...");

    // 1. wasm-pack でビルド
    println!("📦 Running wasm-pack build...");
    let status = Command::new("wasm-pack")
        .env("CARGO_INCREMENTAL", "1")
        .args([
            "build",
            "--release",
            "--target",
            "web",
            "--out-dir",
            "pkg",
            "--no-default-features",
            "--features",
            "wasm",
        ])
        .status()
        .map_err(|e| format!("Failed to execute wasm-pack: {}", e))?;

    if !status.success() {
        return Err("wasm-pack build failed".to_string());
    }

    println!("✅ WASM build completed");

    let pkg_dir = if Path::new("pkg").exists() {
        Path::new("pkg")
    } else {
        // カレントディレクトリがpkgの場合
        Path::new(".")
    };

    // 2. wasmの読み込みパスをオリジン基準に修正
    println!("🔧 Fixing asset paths...");
    fix_asset_paths(pkg_dir)?;

    // 3. HTML ファイルを生成
    println!("📝 Generating HTML file...");
    generate_index_html(pkg_dir)?;

    println!("✅ HTML file generated:");
    println!("   - pkg/index.html");

    println!("\n🎉 Build complete! Serve the pkg/ directory with any static file server.");
    Ok(())
}

fn generate_index_html(pkg_dir: &Path) -> Result<(), String> {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Psi. Mayara Luna | Psicoterapia Online</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        html {{
            scroll-behavior: smooth;
        }}
        #container {{
            width: 100%;
            min-height: 100vh;
        }}
        @media (prefers-reduced-motion: reduce) {{
            #container .reveal {{
                transition: none !important;
            }}
        }}
    </style>
</head>
<body>
    <div id="container"></div>
    <script type="module">
        import init from '/{}';
        init().catch(console.error);
    </script>
</body>
</html>
"#,
        JS_NAME
    );

    fs::write(pkg_dir.join("index.html"), html).map_err(|e| format!("Failed to write index.html: {}", e))
}

fn fix_asset_paths(pkg_dir: &Path) -> Result<(), String> {
    let js_path = pkg_dir.join(JS_NAME);

    if !js_path.exists() {
        eprintln!("⚠️  Warning: {} not found, skipping path fix", JS_NAME);
        return Ok(());
    }

    let content = fs::read_to_string(&js_path).map_err(|e| format!("Failed to read {}: {}", JS_NAME, e))?;

    let fixed_content = content.replace(
        &format!("new URL('{}', import.meta.url)", WASM_NAME),
        &format!("new URL('/{}', window.location.origin)", WASM_NAME),
    );

    fs::write(&js_path, fixed_content).map_err(|e| format!("Failed to write {}: {}", JS_NAME, e))?;

    println!("   ✓ Fixed WASM path in {}", JS_NAME);
    Ok(())
}
