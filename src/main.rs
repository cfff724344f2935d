fn main() {
    if let Err(err) = column_normalizer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
