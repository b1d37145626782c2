use std::fmt;

/// Text gathered over one agent run. Only ever appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context(String);

impl Context {
    pub fn seed(query: &str) -> Self {
        Self(format!("Исходный запрос: {}\n\n", query))
    }

    pub fn push_search(&mut self, query: &str, summary: &str) {
        self.0.push_str(&format!(
            "\nРезультаты поиска по запросу \"{}\":\n{}\n\n",
            query, summary
        ));
    }

    pub fn push_step(&mut self, description: &str) {
        self.0.push_str(&format!("\nШаг плана: {}\n", description));
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
