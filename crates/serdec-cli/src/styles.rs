use console::Style;

pub struct Styles {
    pub title: Style,
    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub good: Style,
    pub warn: Style,
    pub path: Style,
}

impl Styles {
    pub fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            good: Style::new().green(),
            warn: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }

    pub fn banner(&self, title: &str) {
        println!();
        println!("  {}", self.title.apply_to(title));
        println!(
            "  {}",
            self.title
                .apply_to("\u{2550}".repeat(title.chars().count()))
        );
        println!();
    }

    pub fn row(&self, label: &str, value: impl std::fmt::Display) {
        println!(
            "  {:<14}{}",
            self.label.apply_to(label),
            self.value.apply_to(value)
        );
    }
}
