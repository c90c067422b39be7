fn main() {
    if let Err(err) = futureeval_chart::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
