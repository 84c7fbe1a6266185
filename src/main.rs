//! collatio binary entry point.

use collatio::ui::output;

fn main() {
    if let Err(err) = collatio::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
