use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use anyhow::Result;

use crate::detection::mask::Mask;
use crate::models::{Color, Point};

/// What a work item currently carries
#[derive(Debug, Clone)]
pub enum Payload {
    /// The source image itself (nothing extracted yet)
    Image,
    /// Binary mask the size of the source image
    Mask(Mask),
    /// One region's mask, cropped around it; `(x, y)` is the crop's
    /// top-left corner in the source image
    Region { mask: Mask, x: u32, y: u32 },
    /// Raw traced boundary, in pixel coordinates
    Contour(Vec<Point>),
    /// Simplified apartment outline
    Polygon(Vec<Point>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Image => "image",
            Payload::Mask(_) => "mask",
            Payload::Region { .. } => "region",
            Payload::Contour(_) => "contour",
            Payload::Polygon(_) => "polygon",
        }
    }
}

/// Data that flows through the pipeline.
/// Each PipelineData is one candidate (a color, then a region, then an outline)
/// plus the metadata gathered about it so far.
#[derive(Clone)]
pub struct PipelineData {
    pub payload: Payload,

    /// The floor plan being analyzed (shared efficiently via Arc)
    pub source: Arc<RgbaImage>,

    /// Apartment color this candidate was extracted for
    pub color: Option<Color>,

    /// Metadata for tracking properties (e.g. "region_pixels", "area")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Float(f64),
    String(String),
    Int(i64),
}

impl PipelineData {
    /// Start from a whole image
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            payload: Payload::Image,
            source: Arc::new(image),
            color: None,
            metadata: HashMap::new(),
        }
    }

    /// Start from a shared image, targeting one apartment color
    pub fn for_color(source: Arc<RgbaImage>, color: Color) -> Self {
        Self {
            payload: Payload::Image,
            source,
            color: Some(color),
            metadata: HashMap::new(),
        }
    }

    /// Same candidate, new payload
    pub fn with_payload(&self, payload: Payload) -> Self {
        Self {
            payload,
            source: self.source.clone(),
            color: self.color,
            metadata: self.metadata.clone(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Color label for log lines
    pub fn color_label(&self) -> String {
        self.color.map(|c| c.css()).unwrap_or_else(|| "<none>".to_string())
    }

    /// Picture of the payload, for debug output
    pub fn render(&self) -> DynamicImage {
        let (width, height) = self.source.dimensions();
        match &self.payload {
            Payload::Image => DynamicImage::ImageRgba8(self.source.as_ref().clone()),
            Payload::Mask(mask) => DynamicImage::ImageLuma8(mask.to_image()),
            Payload::Region { mask, x, y } => {
                let mut canvas = GrayImage::new(width, height);
                image::imageops::replace(&mut canvas, &mask.to_image(), *x as i64, *y as i64);
                DynamicImage::ImageLuma8(canvas)
            }
            Payload::Contour(points) | Payload::Polygon(points) => {
                DynamicImage::ImageRgba8(render_outline(width, height, points))
            }
        }
    }
}

/// A single closed outline, white on black
fn render_outline(width: u32, height: u32, points: &[Point]) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    if points.len() < 2 {
        return canvas;
    }
    for (i, start) in points.iter().enumerate() {
        let end = &points[(i + 1) % points.len()];
        draw_line_segment_mut(
            &mut canvas,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            Rgba([255, 255, 255, 255]),
        );
    }
    canvas
}

/// An image kept from a step's output while debugging
#[derive(Clone)]
pub struct Capture {
    pub step: String,
    pub color: Option<Color>,
    pub lineage: Vec<usize>,
    pub image: DynamicImage,
}

/// Debug configuration for pipeline execution
#[derive(Clone, Default)]
pub struct DebugConfig {
    /// Root directory for per-step image dumps
    pub output_dir: Option<PathBuf>,
    /// Outputs of capturing steps, in execution order
    pub captures: Arc<Mutex<Vec<Capture>>>,
}

impl DebugConfig {
    pub fn take_captures(&self) -> Vec<Capture> {
        match self.captures.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn record(&self, capture: Capture) -> Result<()> {
        self.captures
            .lock()
            .map_err(|_| anyhow::anyhow!("Debug capture lock poisoned"))?
            .push(capture);
        Ok(())
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug directories)
    fn name(&self) -> &str;

    /// Whether this step's outputs are kept in the debug captures
    fn captures_output(&self) -> bool {
        false
    }
}

fn step_dir_name(index: usize, step_name: &str) -> String {
    format!("{:02}_{}", index, step_name.to_lowercase().replace(' ', "_"))
}

fn lineage_filename(lineage: &[usize], extension: &str) -> String {
    if lineage.is_empty() {
        format!("01.{}", extension)
    } else {
        let ids: Vec<String> = lineage.iter().map(|id| format!("{:02}", id)).collect();
        format!("{}.{}", ids.join("-"), extension)
    }
}

/// Dump an item and/or keep it as a capture, depending on the debug config
fn record_debug_output(
    context: &PipelineContext,
    step: &dyn PipelineStep,
    step_index: usize,
    lineage: &[usize],
    data: &PipelineData,
) -> Result<()> {
    let Some(debug_config) = &context.debug else {
        return Ok(());
    };

    if let Some(output_dir) = &debug_config.output_dir {
        let step_dir = output_dir.join(step_dir_name(step_index, step.name()));
        std::fs::create_dir_all(&step_dir)?;
        let filename = lineage_filename(lineage, "png");
        data.render()
            .save(step_dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        log::trace!("Debug: saved {}/{}", step_dir.display(), filename);
    }

    if step.captures_output() {
        debug_config.record(Capture {
            step: step.name().to_string(),
            color: data.color,
            lineage: lineage.to_vec(),
            image: data.render(),
        })?;
    }

    Ok(())
}

/// Work item for pipeline execution
/// Contains data and the remaining steps to execute
#[derive(Clone)]
pub struct WorkItem {
    /// The data to process
    pub data: PipelineData,

    /// Remaining pipeline steps (steps not yet executed)
    pub remaining_steps: Vec<Arc<dyn PipelineStep>>,

    /// Step index (for tracking progress)
    pub current_step_index: usize,

    /// Lineage: IDs from previous steps that led to this item
    /// E.g., [1, 3, 2] means: color 1 → region 3 → outline 2
    pub lineage: Vec<usize>,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(data: PipelineData, steps: Vec<Arc<dyn PipelineStep>>) -> Self {
        Self {
            data,
            remaining_steps: steps,
            current_step_index: 0,
            lineage: vec![],
        }
    }

    pub fn with_lineage(mut self, lineage: Vec<usize>) -> Self {
        self.lineage = lineage;
        self
    }

    /// Check if this work item is complete (no more steps)
    pub fn is_complete(&self) -> bool {
        self.remaining_steps.is_empty()
    }

    /// Generate filename from lineage (e.g., "01-03-02.png")
    pub fn lineage_filename(&self, extension: &str) -> String {
        lineage_filename(&self.lineage, extension)
    }

    /// Run the next step and create work items for its results
    pub fn process_next_step(&mut self, context: &PipelineContext) -> Result<Vec<WorkItem>> {
        if self.remaining_steps.is_empty() {
            return Ok(vec![]);
        }

        let step = self.remaining_steps[0].clone();
        let remaining_after = self.remaining_steps[1..].to_vec();

        // Process the step (this may split 1 item into many, or drop it)
        let results = step.process(vec![self.data.clone()], context)?;

        let mut new_items = Vec::with_capacity(results.len());
        for (idx, result_data) in results.into_iter().enumerate() {
            let mut new_lineage = self.lineage.clone();
            new_lineage.push(idx + 1); // 1-indexed for readability

            let new_item = WorkItem {
                data: result_data,
                remaining_steps: remaining_after.clone(),
                current_step_index: self.current_step_index + 1,
                lineage: new_lineage,
            };

            record_debug_output(
                context,
                step.as_ref(),
                new_item.current_step_index,
                &new_item.lineage,
                &new_item.data,
            )?;

            new_items.push(new_item);
        }

        Ok(new_items)
    }
}

/// Pipeline executor using MPSC channel for work distribution.
/// The queue is FIFO, so results come out in a deterministic order.
pub struct PipelineExecutor {
    sender: Sender<WorkItem>,
    receiver: Receiver<WorkItem>,
    context: PipelineContext,
}

impl PipelineExecutor {
    pub fn new(context: PipelineContext) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            context,
        }
    }

    /// Execute the pipeline by processing work items from the channel
    pub fn execute(&self, initial_items: Vec<WorkItem>) -> Result<Vec<PipelineData>> {
        let mut pending_count = 0usize;
        for item in initial_items {
            self.sender
                .send(item)
                .map_err(|e| anyhow::anyhow!("Failed to send work item: {}", e))?;
            pending_count += 1;
        }

        let mut completed_results = Vec::new();

        while pending_count > 0 {
            match self.receiver.try_recv() {
                Ok(mut item) => {
                    pending_count -= 1;

                    if item.is_complete() {
                        completed_results.push(item.data);
                    } else {
                        for new_item in item.process_next_step(&self.context)? {
                            self.sender
                                .send(new_item)
                                .map_err(|e| anyhow::anyhow!("Failed to send work item: {}", e))?;
                            pending_count += 1;
                        }
                    }
                }
                // Single consumer and producer: an empty queue means we are done
                Err(mpsc::TryRecvError::Empty) | Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }

        Ok(completed_results)
    }
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Keep outputs of capturing steps in memory
    pub fn with_captures(mut self) -> Self {
        self.context.debug.get_or_insert_with(DebugConfig::default);
        self
    }

    /// Enable per-step image dumps into `output_dir`.
    /// The directory must be empty or non-existent
    pub fn with_debug(self, output_dir: PathBuf) -> Result<Self> {
        ensure_empty_dir(&output_dir)?;
        Ok(self.with_debug_output(output_dir))
    }

    /// Enable per-step image dumps into `output_dir` without checking it.
    /// Files from an earlier run with the same lineage are overwritten
    pub fn with_debug_output(mut self, output_dir: PathBuf) -> Self {
        self.context
            .debug
            .get_or_insert_with(DebugConfig::default)
            .output_dir = Some(output_dir);
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn save_input(&self, input: &PipelineData, root_id: usize) -> Result<()> {
        if let Some(output_dir) = self.context.debug.as_ref().and_then(|d| d.output_dir.as_ref()) {
            let input_dir = output_dir.join("00_input");
            std::fs::create_dir_all(&input_dir)?;
            let input_path = input_dir.join(lineage_filename(&[root_id], "png"));
            input
                .render()
                .save(&input_path)
                .map_err(|e| anyhow::anyhow!("Failed to save debug input: {}", e))?;
        }
        Ok(())
    }

    /// Run the pipeline sequentially, one step at a time over all items.
    /// `root_id` is the first lineage id of everything derived from `input`.
    pub fn run(&self, input: PipelineData, root_id: usize) -> Result<Vec<PipelineData>> {
        self.run_partial(input, root_id, self.steps.len())
    }

    /// Run only the first `num_steps` steps (useful for debugging)
    pub fn run_partial(
        &self,
        input: PipelineData,
        root_id: usize,
        num_steps: usize,
    ) -> Result<Vec<PipelineData>> {
        self.save_input(&input, root_id)?;

        let mut items = vec![(vec![root_id], input)];

        for (i, step) in self.steps.iter().take(num_steps).enumerate() {
            log::trace!("Running step: {} (processing {} items)", step.name(), items.len());

            let mut next = Vec::new();
            for (lineage, data) in items {
                let results = step.process(vec![data], &self.context)?;
                for (idx, result) in results.into_iter().enumerate() {
                    let mut child = lineage.clone();
                    child.push(idx + 1);
                    record_debug_output(&self.context, step.as_ref(), i + 1, &child, &result)?;
                    next.push((child, result));
                }
            }
            items = next;

            log::trace!("  → {} items", items.len());
        }

        Ok(items.into_iter().map(|(_, data)| data).collect())
    }

    /// Run the pipeline using the executor with work queue
    pub fn run_with_executor(&self, input: PipelineData, root_id: usize) -> Result<Vec<PipelineData>> {
        self.save_input(&input, root_id)?;

        let initial_item = WorkItem::new(input, self.steps.clone()).with_lineage(vec![root_id]);
        let executor = PipelineExecutor::new(self.context.clone());
        executor.execute(vec![initial_item])
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Create `dir` if needed; fail if it already holds anything
pub fn ensure_empty_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            return Err(anyhow::anyhow!("Debug directory is not empty: {}", dir.display()));
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits a mask payload into one item per set row
    struct RowSplitStep;

    impl PipelineStep for RowSplitStep {
        fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
            let mut result = Vec::new();
            for item in data {
                let (w, h) = item.source.dimensions();
                for y in 0..h {
                    let mut mask = Mask::new(w, h);
                    mask.set(0, y, true);
                    result.push(
                        item.with_payload(Payload::Mask(mask))
                            .with_metadata("row", MetadataValue::Int(y as i64)),
                    );
                }
            }
            Ok(result)
        }

        fn name(&self) -> &str {
            "Row Split"
        }

        fn captures_output(&self) -> bool {
            true
        }
    }

    /// Drops odd rows
    struct EvenRowFilterStep;

    impl PipelineStep for EvenRowFilterStep {
        fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
            Ok(data
                .into_iter()
                .filter(|item| item.get_int("row").is_some_and(|r| r % 2 == 0))
                .collect())
        }

        fn name(&self) -> &str {
            "Even Rows"
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new()
            .add_step(Arc::new(RowSplitStep))
            .add_step(Arc::new(EvenRowFilterStep))
    }

    fn input() -> PipelineData {
        PipelineData::from_image(RgbaImage::new(4, 5))
    }

    #[test]
    fn test_run_and_executor_agree() {
        let sequential = pipeline().run(input(), 1).unwrap();
        let queued = pipeline().run_with_executor(input(), 1).unwrap();

        let rows = |items: &[PipelineData]| items.iter().filter_map(|i| i.get_int("row")).collect::<Vec<_>>();
        assert_eq!(rows(&sequential), vec![0, 2, 4]);
        assert_eq!(rows(&queued), vec![0, 2, 4]);
    }

    #[test]
    fn test_run_partial_stops_early() {
        let items = pipeline().run_partial(input(), 1, 1).unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].payload.kind(), "mask");
    }

    #[test]
    fn test_captures_only_from_capturing_steps() {
        let pipeline = pipeline().with_captures();
        pipeline.run_with_executor(input(), 3).unwrap();

        let captures = pipeline.context().debug.as_ref().unwrap().take_captures();
        assert_eq!(captures.len(), 5);
        assert!(captures.iter().all(|c| c.step == "Row Split"));
        assert_eq!(captures[0].lineage, vec![3, 1]);
    }

    #[test]
    fn test_debug_dumps_use_lineage_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("steps");
        let pipeline = pipeline().with_debug(out.clone()).unwrap();
        pipeline.run_with_executor(input(), 1).unwrap();

        assert!(out.join("00_input/01.png").exists());
        assert!(out.join("01_row_split/01-05.png").exists());
        assert!(out.join("02_even_rows/01-03-01.png").exists());
        assert!(!out.join("02_even_rows/01-02-01.png").exists());
    }

    #[test]
    fn test_debug_output_can_be_reused() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("steps");
        let pipeline = pipeline().with_debug(out.clone()).unwrap();
        pipeline.run_with_executor(input(), 1).unwrap();

        // A second run into the same directory overwrites its dumps
        let again = self::pipeline().with_debug_output(out.clone());
        assert_eq!(again.run_with_executor(input(), 1).unwrap().len(), 3);
        assert_eq!(std::fs::read_dir(out.join("01_row_split")).unwrap().count(), 5);
    }

    #[test]
    fn test_outline_render_draws_edges_only() {
        let points = [
            Point::new(1.0, 1.0),
            Point::new(8.0, 1.0),
            Point::new(8.0, 6.0),
            Point::new(1.0, 6.0),
        ];
        let image = render_outline(10, 8, &points);
        assert_eq!(*image.get_pixel(4, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(1, 3), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(4, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_region_payload_renders_at_its_offset() {
        let mut mask = Mask::new(3, 2);
        mask.set(1, 1, true);
        let data = input().with_payload(Payload::Region { mask, x: 2, y: 3 });

        let image = data.render().to_luma8();
        assert_eq!(image.dimensions(), (4, 5));
        assert_eq!(image.get_pixel(3, 4)[0], 255);
        assert_eq!(image.pixels().filter(|p| p[0] != 0).count(), 1);
        assert_eq!(data.payload.kind(), "region");
    }

    #[test]
    fn test_debug_dir_must_be_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("stale.txt"), "x").unwrap();
        assert!(Pipeline::new().with_debug(dir.path().to_path_buf()).is_err());
    }
}
