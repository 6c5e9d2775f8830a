use serde::{Deserialize, Serialize};

/// A named counter that renders identifiers like `QR/2024/00042`.
///
/// The prefix may contain `%(year)s`, `%(month)s` and `%(day)s`, which are
/// replaced with the date the number is drawn on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub padding: usize,
    #[serde(default = "one")]
    pub number_next: u64,
    #[serde(default = "one")]
    pub number_increment: u64,
}

fn one() -> u64 {
    1
}

impl Sequence {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            prefix: String::new(),
            suffix: String::new(),
            padding: 0,
            number_next: 1,
            number_increment: 1,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Render the current number and advance the counter.
    pub fn draw(&mut self, today: jiff::civil::Date) -> String {
        let number = self.number_next;
        self.number_next = self.number_next.saturating_add(self.number_increment.max(1));
        format!(
            "{}{:0width$}{}",
            interpolate(&self.prefix, today),
            number,
            interpolate(&self.suffix, today),
            width = self.padding
        )
    }
}

fn interpolate(template: &str, today: jiff::civil::Date) -> String {
    template
        .replace("%(year)s", &format!("{:04}", today.year()))
        .replace("%(month)s", &format!("{:02}", today.month()))
        .replace("%(day)s", &format!("{:02}", today.day()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_prefix_and_padding() {
        let today = jiff::civil::date(2024, 3, 9);
        let mut seq = Sequence::new("x", "X")
            .with_prefix("QR/%(year)s/")
            .with_padding(5);
        assert_eq!(seq.draw(today), "QR/2024/00001");
        assert_eq!(seq.draw(today), "QR/2024/00002");
        assert_eq!(seq.number_next, 3);
    }

    #[test]
    fn no_padding_prints_plain_number() {
        let mut seq = Sequence::new("x", "X");
        seq.number_next = 42;
        seq.number_increment = 10;
        assert_eq!(seq.draw(jiff::civil::date(2024, 1, 1)), "42");
        assert_eq!(seq.number_next, 52);
    }
}
