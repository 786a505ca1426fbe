use bot_commons::*;

fn main() {
    // Before anything reads the environment, RUST_LOG included.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load the .env file: {e}");
        }
    }

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "WARN,affiliate_qr_bot=debug");
    }
    start_everything(affiliate_qr_bot::entry());
}
