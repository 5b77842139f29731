//! Script Emission - ExtendScript for the Image Host
//!
//! Pure templating: text in, text out. No file or network access.
//! Identical input yields byte-identical scripts (no timestamps).
//!
//! Per task the script opens the template, selects the resolved layer by id,
//! replaces its contents, applies the combination (resize, translate, skew,
//! rotate), exports a copy, and closes the template without saving.

use std::path::Path;
use thiserror::Error;

use crate::export::{ExportFormat, ExportSettings};
use crate::planner::RenderTask;
use crate::templates::LayerCandidate;
use crate::variation::Combination;
use crate::ENGINE_VERSION;

/// Introduces every per-task block in the emitted text
pub const TASK_MARKER: &str = "// Task ";

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("No layer resolved; resolution must succeed before emission")]
    MissingLayer,

    #[error("Nothing to render: task list is empty")]
    EmptyTaskList,
}

/// Everything the script needs besides the tasks
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub layer: Option<&'a LayerCandidate>,
    pub template_path: &'a Path,
    pub output_folder: &'a Path,
    pub export: ExportSettings,
}

/// Render the automation script for `tasks`, in order.
pub fn emit_script(ctx: &ScriptContext<'_>, tasks: &[RenderTask]) -> Result<String, EmitError> {
    let layer = ctx.layer.ok_or(EmitError::MissingLayer)?;
    if tasks.is_empty() {
        return Err(EmitError::EmptyTaskList);
    }

    let template = host_path(ctx.template_path);
    let folder = host_path(ctx.output_folder);

    let mut w = ScriptWriter::default();
    w.line(0, "#target photoshop");
    w.line(0, format!("// Mockup batch script generated by mockupgen-core {ENGINE_VERSION}"));
    w.line(0, format!("// Template: {}", comment_text(&template)));
    w.line(0, format!(
        "// Layer: {} (id {})",
        comment_text(&layer.tree_path),
        layer.identifier
    ));
    w.line(0, format!("// Tasks: {}", tasks.len()));
    w.line(0, "// The template is reopened for every task and never saved.");
    w.blank();
    w.line(0, "(function () {");
    w.line(1, format!("var TEMPLATE_PATH = {};", js_string(&template)));
    w.line(1, format!("var OUTPUT_FOLDER = {};", js_string(&folder)));
    w.line(1, format!("var LAYER_ID = {};", layer.identifier));
    w.line(1, format!("var LAYER_NAME = {};", js_string(&layer.display_name)));
    w.blank();
    w.raw(HELPERS);
    w.blank();
    write_export_helper(&mut w, &ctx.export);
    w.blank();
    w.raw(RENDER_TASK);
    w.blank();
    w.line(1, "var previousDialogs = app.displayDialogs;");
    w.line(1, "var previousUnits = app.preferences.rulerUnits;");
    w.line(1, "app.displayDialogs = DialogModes.NO;");
    w.line(1, "app.preferences.rulerUnits = Units.PIXELS;");
    w.line(1, "try {");
    w.line(2, "var outputFolder = new Folder(OUTPUT_FOLDER);");
    w.line(2, "if (!outputFolder.exists) {");
    w.line(3, "outputFolder.create();");
    w.line(2, "}");

    let total = tasks.len();
    for task in tasks {
        let file_name = ctx.export.file_name(&task.output_name);
        let artwork = host_path(&task.artwork.source_path);
        w.blank();
        w.line(2, format!(
            "{}{}/{}: {} -> {}",
            TASK_MARKER,
            task.task_index + 1,
            total,
            comment_text(&file_label(&artwork)),
            comment_text(&file_name)
        ));
        w.line(2, format!(
            "renderTask({}, {}, {});",
            js_string(&artwork),
            js_string(&join_output(&folder, &file_name)),
            transform_literal(&task.combination)
        ));
    }

    w.line(1, "} finally {");
    w.line(2, "app.displayDialogs = previousDialogs;");
    w.line(2, "app.preferences.rulerUnits = previousUnits;");
    w.line(1, "}");
    w.line(0, "})();");

    Ok(w.finish())
}

const HELPERS: &str = r##"    function openTemplate() {
        var doc = app.open(new File(TEMPLATE_PATH));
        app.activeDocument = doc;
        return doc;
    }

    function selectLayerById(id) {
        var ref = new ActionReference();
        ref.putIdentifier(charIDToTypeID("Lyr "), id);
        var desc = new ActionDescriptor();
        desc.putReference(charIDToTypeID("null"), ref);
        desc.putBoolean(charIDToTypeID("MkVs"), false);
        executeAction(charIDToTypeID("slct"), desc, DialogModes.NO);
        var layer = app.activeDocument.activeLayer;
        if (layer.kind !== LayerKind.SMARTOBJECT) {
            throw new Error("Layer " + LAYER_NAME + " (id " + id + ") is not a smart object");
        }
        return layer;
    }

    function replaceContents(artworkPath) {
        var artwork = new File(artworkPath);
        if (!artwork.exists) {
            throw new Error("Artwork not found: " + artworkPath);
        }
        var desc = new ActionDescriptor();
        desc.putPath(charIDToTypeID("null"), artwork);
        executeAction(stringIDToTypeID("placedLayerReplaceContents"), desc, DialogModes.NO);
        return app.activeDocument.activeLayer;
    }

    function skewActiveLayer(degrees) {
        var ref = new ActionReference();
        ref.putEnumerated(charIDToTypeID("Lyr "), charIDToTypeID("Ordn"), charIDToTypeID("Trgt"));
        var desc = new ActionDescriptor();
        desc.putReference(charIDToTypeID("null"), ref);
        desc.putEnumerated(charIDToTypeID("FTcs"), charIDToTypeID("QCSt"), charIDToTypeID("Qcsa"));
        var skew = new ActionDescriptor();
        skew.putUnitDouble(charIDToTypeID("Hrzn"), charIDToTypeID("#Ang"), degrees);
        skew.putUnitDouble(charIDToTypeID("Vrtc"), charIDToTypeID("#Ang"), 0);
        desc.putObject(charIDToTypeID("Skew"), charIDToTypeID("Pnt "), skew);
        executeAction(charIDToTypeID("Trnf"), desc, DialogModes.NO);
    }

    function applyTransform(layer, t) {
        if (t.scale !== 100) {
            layer.resize(t.scale, t.scale, AnchorPosition.MIDDLECENTER);
        }
        if (t.offsetX !== 0 || t.offsetY !== 0) {
            layer.translate(new UnitValue(t.offsetX, "px"), new UnitValue(t.offsetY, "px"));
        }
        if (t.tilt !== 0) {
            skewActiveLayer(t.tilt);
        }
        if (t.rotation !== 0) {
            layer.rotate(t.rotation, AnchorPosition.MIDDLECENTER);
        }
    }"##;

const RENDER_TASK: &str = r#"    function renderTask(artworkPath, outputPath, t) {
        var doc = openTemplate();
        try {
            selectLayerById(LAYER_ID);
            var placed = replaceContents(artworkPath);
            applyTransform(placed, t);
            exportDocument(doc, outputPath);
        } finally {
            doc.close(SaveOptions.DONOTSAVECHANGES);
        }
    }"#;

fn write_export_helper(w: &mut ScriptWriter, export: &ExportSettings) {
    w.line(1, "function exportDocument(doc, outputPath) {");
    match export.format {
        ExportFormat::Png => {
            w.line(2, "var options = new PNGSaveOptions();");
            w.line(2, "options.interlaced = false;");
        }
        ExportFormat::Jpeg => {
            w.line(2, "var options = new JPEGSaveOptions();");
            w.line(2, format!("options.quality = {};", export.jpeg_quality));
            w.line(2, "options.embedColorProfile = true;");
        }
    }
    w.line(2, "doc.saveAs(new File(outputPath), options, true, Extension.LOWERCASE);");
    w.line(1, "}");
}

#[derive(Default)]
struct ScriptWriter {
    buf: String,
}

impl ScriptWriter {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    fn raw(&mut self, block: &str) {
        self.buf.push_str(block);
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// The host accepts `/` on every platform.
fn host_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn join_output(folder: &str, file_name: &str) -> String {
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        if folder.starts_with('/') {
            format!("/{file_name}")
        } else {
            file_name.to_string()
        }
    } else {
        format!("{trimmed}/{file_name}")
    }
}

fn file_label(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn transform_literal(c: &Combination) -> String {
    format!(
        "{{ scale: {}, offsetX: {}, offsetY: {}, tilt: {}, rotation: {} }}",
        js_number(c.scale),
        js_number(c.offset.x),
        js_number(c.offset.y),
        js_number(c.tilt),
        js_number(c.rotation)
    )
}

/// Shortest decimal form; never exponent notation, never `-0`.
fn js_number(value: f64) -> String {
    // Non-finite values are dropped during configuration normalization.
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Double-quoted JavaScript string literal.
fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-line comment body
fn comment_text(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() || c == '\u{2028}' || c == '\u{2029}' { '?' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::ArtworkEntry;
    use crate::variation::Offset;
    use std::path::PathBuf;

    fn task(index: usize, artwork: &str, output: &str, combination: Combination) -> RenderTask {
        RenderTask {
            task_index: index,
            artwork_index: index,
            artwork: ArtworkEntry::from_path(artwork),
            combination,
            combination_index: 0,
            output_name: output.to_string(),
        }
    }

    fn emit(layer: Option<&LayerCandidate>, tasks: &[RenderTask]) -> Result<String, EmitError> {
        let template = PathBuf::from("/mockups/shirt.psd");
        let folder = PathBuf::from("/mockups/output/");
        let ctx = ScriptContext {
            layer,
            template_path: &template,
            output_folder: &folder,
            export: ExportSettings::png(),
        };
        emit_script(&ctx, tasks)
    }

    #[test]
    fn test_missing_layer_and_empty_tasks() {
        let layer = LayerCandidate::new("Design", 5);
        let tasks = vec![task(0, "/art/a.png", "a_mockup", Combination::NEUTRAL)];
        assert_eq!(emit(None, &tasks), Err(EmitError::MissingLayer));
        assert_eq!(emit(Some(&layer), &[]), Err(EmitError::EmptyTaskList));
    }

    #[test]
    fn test_one_block_per_task_in_order() {
        let layer = LayerCandidate::new("Design", 5);
        let tasks = vec![
            task(0, "/art/a.png", "a_mockup", Combination::NEUTRAL),
            task(1, "/art/b.png", "b_mockup", Combination::NEUTRAL),
        ];
        let script = emit(Some(&layer), &tasks).unwrap();

        let markers: Vec<&str> = script
            .lines()
            .map(str::trim_start)
            .filter(|l| l.starts_with(TASK_MARKER))
            .collect();
        assert_eq!(markers, vec!["// Task 1/2: a.png -> a_mockup.png", "// Task 2/2: b.png -> b_mockup.png"]);
        assert!(script.contains(r#"renderTask("/art/a.png", "/mockups/output/a_mockup.png", "#));
        assert!(script.contains("var LAYER_ID = 5;"));
        assert!(script.starts_with("#target photoshop\n"));
        assert!(script.contains("doc.close(SaveOptions.DONOTSAVECHANGES);"));
    }

    #[test]
    fn test_transform_literal_formatting() {
        let combo = Combination {
            scale: 95.0,
            offset: Offset::new(-20.0, 0.5),
            tilt: -0.0,
            rotation: 3.25,
        };
        assert_eq!(
            transform_literal(&combo),
            "{ scale: 95, offsetX: -20, offsetY: 0.5, tilt: 0, rotation: 3.25 }"
        );
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(js_string(r#"C:\art\"quoted".png"#), r#""C:\\art\\\"quoted\".png""#);
        assert_eq!(js_string("a\nb\u{0001}"), r#""a\nb\u0001""#);
        assert_eq!(comment_text("evil\nname"), "evil?name");
    }

    #[test]
    fn test_paths_normalized_and_joined() {
        assert_eq!(host_path(Path::new(r"C:\mockups\shirt.psd")), "C:/mockups/shirt.psd");
        assert_eq!(join_output("/out/", "a.png"), "/out/a.png");
        assert_eq!(join_output("/", "a.png"), "/a.png");
        assert_eq!(join_output("", "a.png"), "a.png");
    }

    #[test]
    fn test_jpeg_export_helper() {
        let layer = LayerCandidate::new("Design", 5);
        let template = PathBuf::from("/t.psd");
        let folder = PathBuf::from("/out");
        let ctx = ScriptContext {
            layer: Some(&layer),
            template_path: &template,
            output_folder: &folder,
            export: ExportSettings::jpeg(8).unwrap(),
        };
        let script = emit_script(&ctx, &[task(0, "/a.png", "a_mockup", Combination::NEUTRAL)]).unwrap();
        assert!(script.contains("new JPEGSaveOptions()"));
        assert!(script.contains("options.quality = 8;"));
        assert!(script.contains(r#""/out/a_mockup.jpg""#));
    }

    #[test]
    fn test_helpers_carry_skew_and_unsaved_close() {
        let layer = LayerCandidate::new("Design", 5);
        let tilted = Combination { tilt: -5.0, ..Combination::NEUTRAL };
        let script = emit(Some(&layer), &[task(0, "/art/a.png", "a_mockup", tilted)]).unwrap();

        assert!(script.contains("function skewActiveLayer(degrees)"));
        assert!(script.contains(r##"charIDToTypeID("#Ang")"##));
        assert!(script.contains("var doc = openTemplate();"));
        assert!(script.contains("doc.close(SaveOptions.DONOTSAVECHANGES);"));
        assert!(!script.contains("duplicate("));
        assert!(script.trim_end().ends_with("})();"));
    }

    #[test]
    fn test_deterministic() {
        let layer = LayerCandidate::new("Design", 5);
        let tasks = vec![task(0, "/art/a.png", "a_mockup", Combination::NEUTRAL)];
        assert_eq!(emit(Some(&layer), &tasks), emit(Some(&layer), &tasks));
    }
}
