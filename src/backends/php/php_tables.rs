//! Class level declarations: among tables, grouping bitmaps and variable fields.

use crate::backends::php::ClassEmitter;
use crate::backends::php::php_expr::php_string_literal;
use crate::compiler_messages::compiler_errors::{CompilerError, ProgramLocation};
use crate::program::program::{Among, Grouping, NameKind};
use crate::return_malformed_error;

impl<'prog> ClassEmitter<'prog> {
    pub(crate) fn emit_among_tables(&mut self) -> Result<(), CompilerError> {
        let program = self.program;
        for (number, among) in program.amongs.iter().enumerate() {
            self.emit_among_table(number, among)?;
        }

        Ok(())
    }

    fn emit_among_table(&mut self, number: usize, among: &Among) -> Result<(), CompilerError> {
        if self.config.comments {
            self.emit_line(&format!("// among, line {}", among.line));
        }

        let mut rows = Vec::with_capacity(among.entries.len());
        for entry in &among.entries {
            let mut row = format!(
                "[{}, {}, {}",
                php_string_literal(&entry.text),
                entry.substring_index,
                entry.result
            );

            // Routine that must also succeed for the entry to match
            if let Some(function) = entry.function {
                let name = self.program.name(function)?;
                row.push_str(&format!(", '{}{}'", name.kind.prefix(), name.name));
            }

            row.push(']');
            rows.push(row);
        }

        self.emit_line(&format!("private array $a_{} = [", number));
        self.with_indent(|emitter| {
            let last = rows.len().saturating_sub(1);
            for (index, row) in rows.iter().enumerate() {
                if index < last {
                    emitter.emit_line(&format!("{},", row));
                } else {
                    emitter.emit_line(row);
                }
            }
        });
        self.emit_line("];");
        self.emit_line("");

        Ok(())
    }

    /// Bitmaps for the groupings that are actually referenced.
    pub(crate) fn emit_grouping_tables(&mut self) -> Result<(), CompilerError> {
        let program = self.program;
        for grouping in &program.groupings {
            let name = program.name(grouping.name)?;
            if !name.used {
                continue;
            }

            let bits = grouping_bitmap(grouping)?
                .iter()
                .map(|byte| byte.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            self.emit_line(&format!("private array $g_{} = [{}];", name.name, bits));
            self.emit_line("");
        }

        Ok(())
    }

    pub(crate) fn emit_fields(&mut self) {
        let mut wrote_fields = false;

        let program = self.program;
        for name in &program.names {
            let field = match name.kind {
                NameKind::String => format!("private string $S_{} = '';", name.name),
                NameKind::Integer => format!("private int $I_{} = 0;", name.name),
                NameKind::Boolean => format!("private bool $B_{} = false;", name.name),
                _ => continue,
            };

            self.emit_line(&field);
            wrote_fields = true;
        }

        if wrote_fields {
            self.emit_line("");
        }
    }
}

/// Membership bitmap, 8 characters per element, bit `i % 8` of element `i / 8`
/// standing for character `smallest_ch + i`.
///
/// Ranges that are empty, run past the last code point or leave members outside
/// them are rejected rather than sized.
pub fn grouping_bitmap(grouping: &Grouping) -> Result<Vec<u8>, CompilerError> {
    if grouping.largest_ch > char::MAX as u32 {
        return_malformed_error!(
            format!(
                "grouping {} reaches character {} which is past the last code point",
                grouping.name.0, grouping.largest_ch
            ),
            ProgramLocation::default(),
            {
                NodeKind => "grouping",
                CompilationStage => "PHP generation",
            }
        );
    }

    let Some(span) = grouping.largest_ch.checked_sub(grouping.smallest_ch) else {
        return_malformed_error!(
            format!(
                "grouping {} has an empty range {}..{}",
                grouping.name.0, grouping.smallest_ch, grouping.largest_ch
            ),
            ProgramLocation::default(),
            {
                NodeKind => "grouping",
                CompilationStage => "PHP generation",
            }
        );
    };

    let mut bitmap = vec![0u8; (span as usize + 1).div_ceil(8)];

    for ch in &grouping.members {
        let offset = match ch.checked_sub(grouping.smallest_ch) {
            Some(offset) if offset <= span => offset as usize,
            _ => {
                return_malformed_error!(
                    format!(
                        "grouping {} contains character {} outside its range {}..{}",
                        grouping.name.0, ch, grouping.smallest_ch, grouping.largest_ch
                    ),
                    ProgramLocation::default(),
                    {
                        NodeKind => "grouping",
                        CompilationStage => "PHP generation",
                    }
                );
            }
        };
        bitmap[offset / 8] |= 1 << (offset % 8);
    }

    Ok(bitmap)
}
