fn main() {
    navmacro::cli::run();
}
