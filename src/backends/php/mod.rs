//! PHP backend.
//!
//! Lowers an analysed program into a single PHP class: one method per routine, `goto`
//! labels for backtracking and explicit cursor saves. Routines are translated
//! independently on the rayon pool and stitched together in definition order, so the
//! output doesn't depend on scheduling.

pub(crate) mod continuation;
mod php_among;
mod php_combinators;
mod php_cursor;
pub(crate) mod php_expr;
mod php_loops;
mod php_routine;
pub(crate) mod php_tables;
pub(crate) mod routine_emitter;


use crate::backends::php::routine_emitter::RoutineEmitter;
use crate::compiler_messages::compiler_errors::{CompilerError, ProgramLocation};
use crate::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::program::ast_nodes::{Node, NodeKind};
use crate::program::program::{NameId, NameKind, Program};
use crate::return_malformed_error;
use crate::settings::GeneratorConfig;
use rayon::prelude::*;

pub use continuation::{Continuation, FailTarget, Position, Reach};
pub use php_expr::php_string_literal;
pub use php_tables::grouping_bitmap;

/// Result of lowering a program to PHP.
#[derive(Debug, Clone)]
pub struct PhpUnit {
    /// Complete PHP source of the class.
    pub source: String,

    /// Method names, in the order they appear in `source`.
    pub routine_names: Vec<String>,
    pub warnings: Vec<CompilerWarning>,
}

pub fn lower_program_to_php(
    program: &Program,
    config: &GeneratorConfig,
) -> Result<PhpUnit, CompilerError> {
    ClassEmitter::new(program, config).lower_class(true)
}

/// Same output as `lower_program_to_php`, translating one routine at a time.
pub fn lower_program_to_php_sequential(
    program: &Program,
    config: &GeneratorConfig,
) -> Result<PhpUnit, CompilerError> {
    ClassEmitter::new(program, config).lower_class(false)
}

pub(crate) struct ClassEmitter<'prog> {
    pub(crate) program: &'prog Program,
    pub(crate) config: &'prog GeneratorConfig,

    pub(crate) out: String,
    pub(crate) indent: usize,

    warnings: Vec<CompilerWarning>,
}

// Everything a worker needs to translate one routine on its own
struct RoutineJob<'prog> {
    definition: &'prog Node,
    routine: NameId,
    body: &'prog Node,
    method_name: String,
    first_debug_id: u32,
}

impl<'prog> ClassEmitter<'prog> {
    fn new(program: &'prog Program, config: &'prog GeneratorConfig) -> Self {
        Self {
            program,
            config,
            out: String::new(),
            indent: 0,
            warnings: Vec::new(),
        }
    }

    fn lower_class(mut self, parallel: bool) -> Result<PhpUnit, CompilerError> {
        let jobs = self.collect_routine_jobs()?;

        let program = self.program;
        let config = self.config;
        let methods = if parallel {
            jobs.par_iter()
                .map(|job| lower_routine(program, config, job))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            jobs.iter()
                .map(|job| lower_routine(program, config, job))
                .collect::<Result<Vec<_>, _>>()?
        };

        self.emit_line("<?php");
        if !config.header_comment.is_empty() {
            self.emit_line(&format!("// {}", config.header_comment));
        }
        self.emit_line("");
        self.emit_line(&format!(
            "class {} extends {} {{",
            config.class_name, config.parent_class_name
        ));
        self.emit_line("");

        self.indent += 1;
        self.emit_among_tables()?;
        self.emit_grouping_tables()?;
        self.emit_fields();
        self.indent -= 1;

        for (index, method) in methods.iter().enumerate() {
            if index > 0 {
                self.emit_line("");
            }
            self.out.push_str(method);
        }

        self.emit_line("}");

        Ok(PhpUnit {
            source: self.out,
            routine_names: jobs.into_iter().map(|job| job.method_name).collect(),
            warnings: self.warnings,
        })
    }

    /// Routines to generate, in definition order. Unused internal routines are dropped
    /// with a warning; externals are always generated.
    fn collect_routine_jobs(&mut self) -> Result<Vec<RoutineJob<'prog>>, CompilerError> {
        let program = self.program;
        let mut jobs = Vec::with_capacity(program.definitions.len());
        let mut next_debug_id = 0;

        for definition in &program.definitions {
            let NodeKind::Define { routine, body } = &definition.kind else {
                return_malformed_error!(
                    format!(
                        "top level '{}' is not a routine definition",
                        definition.kind.keyword()
                    ),
                    ProgramLocation::at_line(definition.line),
                    {
                        NodeKind => definition.kind.keyword(),
                        CompilationStage => "PHP generation",
                    }
                );
            };

            let name = program.name(*routine)?;
            if name.kind == NameKind::Routine && !name.used {
                self.warnings.push(CompilerWarning::new(
                    &name.name,
                    ProgramLocation::in_routine(&name.name, definition.line),
                    WarningKind::UnusedRoutine,
                ));
                continue;
            }

            jobs.push(RoutineJob {
                definition,
                routine: *routine,
                body,
                method_name: format!("{}{}", name.kind.prefix(), name.name),
                first_debug_id: next_debug_id,
            });

            next_debug_id += count_debug_calls(program, body);
        }

        for grouping in &program.groupings {
            let name = program.name(grouping.name)?;
            if !name.used {
                self.warnings.push(CompilerWarning::new(
                    &name.name,
                    ProgramLocation::default(),
                    WarningKind::UnusedGrouping,
                ));
            }
        }

        Ok(jobs)
    }

    pub(crate) fn emit_line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str("    ");
            }
        }

        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(crate) fn with_indent<F>(&mut self, mut callback: F)
    where
        F: FnMut(&mut Self),
    {
        self.indent += 1;
        callback(self);
        self.indent -= 1;
    }
}

fn lower_routine(
    program: &Program,
    config: &GeneratorConfig,
    job: &RoutineJob<'_>,
) -> Result<String, CompilerError> {
    let routine_name = &program.name(job.routine)?.name;
    let mut emitter = RoutineEmitter::new(program, config, routine_name, job.first_debug_id);
    emitter.lower_define(job.definition, job.routine, job.body)?;
    Ok(emitter.out)
}

/// Upper bound on the `debug` calls a routine can emit. Each routine gets its own id range
/// up front so numbering doesn't depend on which thread gets there first.
///
/// Counted on the tree before generation, so a `debug` that ends up pruned as dead code
/// (after a `fail`, or in an `or` branch nothing falls into) still holds its id. Ids stay
/// unique and ordered by definition, but the emitted sequence can have gaps.
fn count_debug_calls(program: &Program, node: &Node) -> u32 {
    let own: u32 = match &node.kind {
        NodeKind::Debug => 1,
        NodeKind::Among(among) => program
            .amongs
            .get(among.0 as usize)
            .map(|among| {
                among
                    .commands
                    .iter()
                    .map(|command| count_debug_calls(program, command))
                    .sum()
            })
            .unwrap_or(0),
        _ => 0,
    };

    own + node
        .kind
        .children()
        .into_iter()
        .map(|child| count_debug_calls(program, child))
        .sum::<u32>()
}
