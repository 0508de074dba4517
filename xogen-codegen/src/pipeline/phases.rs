//! Built-in phases.

use std::collections::BTreeSet;

use xogen_core::{Engine, Error, Result};
use xogen_ir::SchemaDefinition;

use super::{GenerationContext, Loaded, Phase};
use crate::{
    builder::SchemaBuilder,
    helpers::Helpers,
    output::{OutputAssembler, PostProcessor},
    render::{Segment, TemplateInput, TemplateSet},
};

/// Loads every connection into the model, in declaration order.
pub struct IntrospectPhase;

impl Phase for IntrospectPhase {
    fn name(&self) -> &'static str {
        "introspect"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let registry = ctx.registry;
        let mut seen = BTreeSet::new();
        for conn in &ctx.connections {
            if !seen.insert(conn.engine) {
                return Err(Box::new(Error::DuplicateEngine {
                    engine: conn.engine.to_string(),
                }));
            }
            registry.get(conn.engine)?;
        }

        let settings = ctx.settings;
        for conn in ctx.connections.iter_mut() {
            let loader = registry.get(conn.engine)?;
            let db = conn.db.as_mut();

            let schema = match &settings.schema {
                Some(schema) => schema.clone(),
                None => loader.schema_name(db)?,
            };
            tracing::info!(engine = %conn.engine, schema = %schema, "introspecting");

            let builder = SchemaBuilder::new(settings, loader);
            let loaded = match &settings.query {
                Some(qs) => Loaded::Query {
                    query: builder.build_query(db, &schema, qs)?,
                    schema,
                },
                None => {
                    let catalog = loader.load_schema(db, &schema)?;
                    Loaded::Schema(builder.build(&catalog)?)
                }
            };
            ctx.loaded.push((conn.engine, loaded));
        }
        Ok(())
    }
}

/// Renders every model fragment into segments.
///
/// Type, index and foreign-key fragments come from every connection; the
/// schema and extension fragments only from the first one.
pub struct RenderPhase;

impl Phase for RenderPhase {
    fn name(&self) -> &'static str {
        "render"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let Some(primary) = ctx.primary_engine() else {
            return Ok(());
        };
        let settings = ctx.settings;
        let registry = ctx.registry;
        let templates = ctx.templates;
        let mut segments = Vec::new();

        for (engine, loaded) in &ctx.loaded {
            let loader = registry.get(*engine)?;
            let mut h = Helpers::new(&mut ctx.run, settings, loader);
            let tag = Some(*engine);

            match loaded {
                Loaded::Schema(def) => {
                    for ty in def.types() {
                        let input = TemplateInput::Type(ty);
                        segments.push(render(templates, &mut h, input, tag, &ty.name, "")?);
                    }
                    for ty in &def.tables {
                        for fk in &ty.foreign_keys {
                            let input = TemplateInput::ForeignKey(fk);
                            let sub = &fk.name;
                            segments.push(render(templates, &mut h, input, tag, &ty.name, sub)?);
                        }
                        for index in &ty.indexes {
                            let input = TemplateInput::Index(ty, index);
                            let sub = &index.func_name;
                            segments.push(render(templates, &mut h, input, tag, &ty.name, sub)?);
                        }
                    }
                }
                Loaded::Query { query, .. } => {
                    let name = &query.result.name;
                    let input = TemplateInput::QueryType(&query.result);
                    segments.push(render(templates, &mut h, input, tag, name, "")?);
                    let input = TemplateInput::Query(query);
                    segments.push(render(templates, &mut h, input, tag, name, &query.name)?);
                }
            }
        }

        let loader = registry.get(primary)?;
        let merged = merged_definition(ctx);
        let engines = engine_order(ctx);
        let mut h = Helpers::new(&mut ctx.run, settings, loader);

        if let Some(def) = &merged {
            let input = TemplateInput::Schema(def);
            segments.push(render(templates, &mut h, input, None, "schema", "")?);
            for ty in def.types() {
                let input = TemplateInput::Extension(ty, def);
                segments.push(render(templates, &mut h, input, None, &ty.name, "")?);
            }
        }
        let input = TemplateInput::Root(&engines);
        segments.push(render(templates, &mut h, input, None, "xo_db", "")?);
        let header = templates.render(&TemplateInput::Package, &mut h)?;

        tracing::info!(segments = segments.len(), "rendered segments");
        ctx.header = header;
        ctx.segments = segments;
        Ok(())
    }
}

fn render(
    templates: &TemplateSet,
    h: &mut Helpers<'_>,
    input: TemplateInput<'_>,
    engine: Option<Engine>,
    name: &str,
    subname: &str,
) -> Result<Segment> {
    let content = templates.render(&input, h)?;
    Ok(Segment::new(input.kind(), engine, name, content).with_subname(subname))
}

/// The first connection's engine, then the others sorted.
fn engine_order(ctx: &GenerationContext<'_>) -> Vec<Engine> {
    let mut rest: Vec<Engine> = ctx.loaded.iter().skip(1).map(|(e, _)| *e).collect();
    rest.sort();
    ctx.loaded.iter().take(1).map(|(e, _)| *e).chain(rest).collect()
}

/// The first connection's tables and views, listing every contributing
/// engine with the first one leading and the rest sorted.
fn merged_definition(ctx: &GenerationContext<'_>) -> Option<SchemaDefinition> {
    let first = ctx.primary_definition()?;
    let mut merged = first.clone();

    merged.engines = engine_order(ctx);

    for (_, loaded) in ctx.loaded.iter().skip(1) {
        if let Some(def) = loaded.definition() {
            merged.known_types.extend(def.known_types.iter().cloned());
        }
    }
    Some(merged)
}

/// Writes the rendered segments to disk.
pub struct WritePhase;

impl Phase for WritePhase {
    fn name(&self) -> &'static str {
        "write"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let assembler = OutputAssembler::new(ctx.settings, &ctx.header);
        ctx.written = assembler.write(ctx.segments.clone())?;
        Ok(())
    }
}

/// Hands the written files to the external formatter, when configured.
pub struct PostProcessPhase;

impl Phase for PostProcessPhase {
    fn name(&self) -> &'static str {
        "post-process"
    }

    fn run(&self, ctx: &mut GenerationContext<'_>) -> Result<()> {
        let Some(processor) = ctx.settings.formatter.as_deref().and_then(PostProcessor::new) else {
            return Ok(());
        };
        let paths: Vec<_> = ctx.written.iter().map(|w| w.path.clone()).collect();
        processor.run(&paths)
    }
}
