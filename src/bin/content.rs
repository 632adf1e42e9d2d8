use feed_filter::scanner::FeedScanner;

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    // Listeners and the mutation observer keep the scanner alive.
    let _scanner = FeedScanner::install();
}
