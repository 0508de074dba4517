//! Indentation-aware text builder for Go source.

/// Fluent builder producing tab-indented Go code.
///
/// Consuming methods (returning `Self`) chain; `push_*` methods work on a
/// `&mut` builder inside loops.
///
/// ```
/// use xogen_codegen::CodeBuilder;
///
/// let code = CodeBuilder::new()
///     .block("func (b *Book) Exists() bool {", |b| b.line("return b._exists"))
///     .build();
///
/// assert_eq!(code, "func (b *Book) Exists() bool {\n\treturn b._exists\n}\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    level: usize,
    buffer: String,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, s: &str) -> &mut Self {
        if !s.is_empty() {
            for _ in 0..self.level {
                self.buffer.push('\t');
            }
            self.buffer.push_str(s);
        }
        self.buffer.push('\n');
        self
    }

    pub fn push_blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn push_indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn push_dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// A `//` comment, one line per line of `text`.
    pub fn push_comment(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            let comment = format!("// {line}");
            self.push_line(comment.trim_end());
        }
        self
    }

    /// `header`, the indented body, then `}`.
    pub fn push_block(&mut self, header: &str, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.push_line(header).push_indent();
        f(self);
        self.push_dedent().push_line("}")
    }

    pub fn line(mut self, s: &str) -> Self {
        self.push_line(s);
        self
    }

    pub fn blank(mut self) -> Self {
        self.push_blank();
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.push_comment(text);
        self
    }

    /// `header`, the indented body, then `}`.
    pub fn block(self, header: &str, f: impl FnOnce(Self) -> Self) -> Self {
        self.block_with_close(header, "}", f)
    }

    pub fn block_with_close(mut self, header: &str, close: &str, f: impl FnOnce(Self) -> Self) -> Self {
        self.push_line(header).push_indent();
        let mut inner = f(self);
        inner.push_dedent().push_line(close);
        inner
    }

    /// Apply `f` to every item, chaining the builder through.
    pub fn each<T>(self, items: impl IntoIterator<Item = T>, f: impl Fn(Self, T) -> Self) -> Self {
        items.into_iter().fold(self, f)
    }

    pub fn when(self, cond: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if cond { f(self) } else { self }
    }

    pub fn build(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks_use_tabs() {
        let code = CodeBuilder::new()
            .block("func f() {", |b| {
                b.block("if ok {", |b| b.line("return"))
            })
            .build();

        assert_eq!(code, "func f() {\n\tif ok {\n\t\treturn\n\t}\n}\n");
    }

    #[test]
    fn test_empty_line_has_no_indent() {
        let code = CodeBuilder::new()
            .block_with_close("type Book struct {", "}", |b| b.line("A int").line("").line("B int"))
            .build();

        assert_eq!(code, "type Book struct {\n\tA int\n\n\tB int\n}\n");
    }

    #[test]
    fn test_push_api_and_comments() {
        let mut b = CodeBuilder::new();
        b.push_comment("Book represents a row.\nGenerated.");
        b.push_block("type Book struct {", |b| {
            for name in ["A int", "B int"] {
                b.push_line(name);
            }
        });

        assert_eq!(
            b.build(),
            "// Book represents a row.\n// Generated.\ntype Book struct {\n\tA int\n\tB int\n}\n"
        );
    }

    #[test]
    fn test_each_and_when() {
        let code = CodeBuilder::new()
            .each(["a", "b"], |b, s| b.line(s))
            .when(false, |b| b.line("never"))
            .build();
        assert_eq!(code, "a\nb\n");
    }
}
