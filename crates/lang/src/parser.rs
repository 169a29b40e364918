//! Parser / block table builder.
//!
//! Consumes the scanner's word stream and produces a [`BlockTable`]: a flat
//! `name -> Block` map. Function definitions (`fun ... as ... end`) recurse
//! into a fresh sub-parser over just their body words, exactly as the
//! reference implementation re-feeds a fresh word scanner over a collected
//! function body; everything else appends classified tokens to the
//! currently-building block.

use numen_core::{NumenError, NumenResult, SourcePos, TypeName, Value};

use crate::block::{BlockTable, Parameter, GLOBAL};
use crate::builtins::is_builtin_name;
use crate::scanner::{Scanner, Word};

const KEYWORDS: &[(&str, numen_core::Keyword)] = &[
    ("end", numen_core::Keyword::End),
    ("if", numen_core::Keyword::If),
    ("iff", numen_core::Keyword::Iff),
    ("else", numen_core::Keyword::Else),
    ("while", numen_core::Keyword::While),
    ("do", numen_core::Keyword::Do),
    ("as", numen_core::Keyword::As),
    ("let", numen_core::Keyword::Let),
    ("var", numen_core::Keyword::Var),
    ("import", numen_core::Keyword::Import),
];

fn keyword_for(word: &str) -> Option<numen_core::Keyword> {
    KEYWORDS.iter().find(|(spelling, _)| *spelling == word).map(|(_, kw)| *kw)
}

/// Is this an opener that increases nesting depth when scanning for a
/// matching `end`? Only `if` and `while` open a block; `do`, `else` and
/// `iff` do not.
fn is_block_opener(word: &str) -> bool {
    word == "if" || word == "while"
}

/// Parse a complete program into a block table. Always contains `_global`.
pub fn parse_program(source: &str) -> NumenResult<BlockTable> {
    let words: Vec<Word> = Scanner::new(source).collect();
    let mut table = BlockTable::new();
    let mut parser = Parser { words, pos: 0 };
    parser.parse_block(&mut table, GLOBAL)?;
    Ok(table)
}

struct Parser<'a> {
    words: Vec<Word<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Word<'a>> {
        self.words.get(self.pos)
    }

    fn advance(&mut self) -> Option<Word<'a>> {
        let w = self.words.get(self.pos).cloned();
        if w.is_some() {
            self.pos += 1;
        }
        w
    }

    fn current_line(&self) -> usize {
        self.words.get(self.pos).or_else(|| self.words.last()).map(|w| w.line).unwrap_or(1)
    }

    /// Parse words into `table[block_name]`, creating the block if absent,
    /// until the word stream is exhausted. Encountering `fun` recurses into
    /// a nested parse of just that function's body.
    fn parse_block(&mut self, table: &mut BlockTable, block_name: &str) -> NumenResult<()> {
        table.entry_or_insert(block_name);

        while let Some(word) = self.peek().cloned() {
            if starts_string_literal(word.text) {
                let s = self.parse_string_literal()?;
                table.entry_or_insert(block_name).body.push(Value::String(s));
                continue;
            }

            if word.text == "fun" {
                self.parse_function_def(table)?;
                continue;
            }

            self.advance();

            if is_builtin_name(word.text) {
                table.entry_or_insert(block_name).body.push(Value::Function(word.text.to_string()));
                continue;
            }

            if let Some(kw) = keyword_for(word.text) {
                table.entry_or_insert(block_name).body.push(Value::Keyword(kw));
                continue;
            }

            if let Some(type_name) = TypeName::parse(word.text) {
                table.entry_or_insert(block_name).body.push(Value::Type(type_name));
                continue;
            }

            if let Ok(n) = word.text.parse::<i64>() {
                table.entry_or_insert(block_name).body.push(Value::Int(n));
                continue;
            }

            if let Ok(x) = word.text.parse::<f64>() {
                table.entry_or_insert(block_name).body.push(Value::Float(x));
                continue;
            }

            if let Ok(b) = word.text.parse::<bool>() {
                table.entry_or_insert(block_name).body.push(Value::Bool(b));
                continue;
            }

            table.entry_or_insert(block_name).body.push(Value::Identifier(word.text.to_string()));
        }

        Ok(())
    }

    fn parse_string_literal(&mut self) -> NumenResult<String> {
        let opening = self.advance().expect("caller checked peek");
        let quote = opening.text.chars().next().expect("caller checked non-empty");
        let mut buffer = opening.text[quote.len_utf8()..].to_string();

        while !ends_with_unescaped_quote(&buffer, quote) {
            match self.advance() {
                Some(next) => {
                    buffer.push(' ');
                    buffer.push_str(next.text);
                }
                None => {
                    return Err(NumenError::scan(
                        "unterminated string literal: missing closing quote",
                        SourcePos { line: opening.line },
                    ));
                }
            }
        }
        buffer.pop(); // drop the closing quote
        Ok(buffer)
    }

    fn parse_function_def(&mut self, table: &mut BlockTable) -> NumenResult<()> {
        let fun_line = self.current_line();
        self.advance(); // 'fun'

        let name_word = self.advance().ok_or_else(|| {
            NumenError::parse("expected a function name after 'fun'", SourcePos { line: fun_line })
        })?;
        let fname = name_word.text.to_string();
        table.entry_or_insert(&fname);

        loop {
            let w = self.advance().ok_or_else(|| {
                NumenError::parse(
                    format!("unterminated parameter list for '{fname}': missing 'as'"),
                    SourcePos { line: fun_line },
                )
            })?;
            if w.text == "as" {
                break;
            }
            let param = match TypeName::parse(w.text) {
                Some(t) => Parameter::Typed(t),
                None => Parameter::Identifier(w.text.to_string()),
            };
            table.entry_or_insert(&fname).parameters.push(param);
        }

        let mut depth: i32 = 0;
        let mut body_words: Vec<Word<'a>> = Vec::new();
        loop {
            let w = self.advance().ok_or_else(|| {
                NumenError::parse(
                    format!("unterminated body for function '{fname}': missing 'end'"),
                    SourcePos { line: fun_line },
                )
            })?;
            if w.text == "end" && depth == 0 {
                break;
            }
            if is_block_opener(w.text) {
                depth += 1;
            } else if w.text == "end" {
                depth -= 1;
            }
            body_words.push(w);
        }

        let mut nested = Parser { words: body_words, pos: 0 };
        nested.parse_block(table, &fname)?;
        Ok(())
    }
}

fn starts_string_literal(word: &str) -> bool {
    word.starts_with('"') || word.starts_with('\'')
}

fn ends_with_unescaped_quote(s: &str, quote: char) -> bool {
    let mut chars = s.chars().rev();
    match chars.next() {
        Some(c) if c == quote => !matches!(chars.next(), Some('\\')),
        _ => false,
    }
}
