fn main() {
    #[cfg(all(feature = "native", not(target_arch = "wasm32")))]
    {
        let cli_args = luna_site::parse_args();

        if let Err(e) = luna_site::run(&cli_args) {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        // WASM環境では何もしない（wasm_entry::mainで処理）
    }
}
