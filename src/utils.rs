/// Calculates the 1-based line and column number for a given byte position in the source text.
/// This function is designed to be called only when an error occurs, as it iterates through
/// the source text to determine the position. Columns count characters, not bytes.
pub fn line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column() {
        let src = "ab\ncd\n";
        assert_eq!(line_and_column(src, 0), (1, 1));
        assert_eq!(line_and_column(src, 1), (1, 2));
        assert_eq!(line_and_column(src, 3), (2, 1));
        assert_eq!(line_and_column(src, 4), (2, 2));
        assert_eq!(line_and_column(src, 100), (3, 1));
    }

    #[test]
    fn test_multibyte_columns() {
        assert_eq!(line_and_column("éx", 2), (1, 2));
    }
}
