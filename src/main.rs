fn main() {
    abacus::config::load_dotenv();
    abacus::logging::init();
    dioxus::launch(abacus::ui::App);
}
