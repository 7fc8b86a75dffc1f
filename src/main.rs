fn main() {
    if let Err(err) = sbmlplot_rs::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
