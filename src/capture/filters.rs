use crate::capture::peak::LuminancePeakProber;
use crate::config::Tonemap;
use std::fmt;
use std::path::Path;

/// Pixel format every screenshot is written in.
const OUTPUT_PIXEL_FORMAT: &str = "rgb24";

/// Floating-point planar RGB used while tone-mapping.
const WORKING_PIXEL_FORMAT: &str = "gbrpf32le";

/// One filter in the chain: a name plus its `:`-separated parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStage {
    pub name: String,
    pub params: Vec<String>,
}

impl FilterStage {
    pub fn new<I, S>(name: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn format(pixel_format: &str) -> Self {
        Self::new("format", [pixel_format])
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}={}", self.name, self.params.join(":"))
        }
    }
}

/// Ordered filter chain, serialized to ffmpeg's `-vf` syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.iter().any(|stage| stage.name == name)
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.stages.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(","))
    }
}

/// Colour-space conversion family used around the tone-mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineVariant {
    /// libswscale `scale`; takes a peak probed from the source metadata.
    #[default]
    Scale,
    /// zimg `zscale`; the tone-mapper detects the peak itself.
    Zscale,
}

impl PipelineVariant {
    pub fn from_zscale_flag(zscale: bool) -> Self {
        if zscale {
            Self::Zscale
        } else {
            Self::Scale
        }
    }

    pub fn filter_name(&self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Zscale => "zscale",
        }
    }

    fn input_params(&self) -> &'static [&'static str] {
        match self {
            Self::Scale => &["in_chroma_loc=topleft"],
            Self::Zscale => &[],
        }
    }

    fn linear_params(&self) -> &'static [&'static str] {
        match self {
            Self::Scale => &["out_transfer=linear"],
            Self::Zscale => &["t=linear"],
        }
    }

    fn output_params(&self) -> &'static [&'static str] {
        match self {
            Self::Scale => &[
                "out_primaries=bt709",
                "out_transfer=bt709",
                "out_color_matrix=bt709",
            ],
            Self::Zscale => &["p=bt709", "t=bt709", "m=bt709"],
        }
    }

    pub fn uses_external_peak(&self) -> bool {
        matches!(self, Self::Scale)
    }

    fn stage(&self, groups: &[&[&str]]) -> FilterStage {
        FilterStage::new(
            self.filter_name(),
            groups.iter().flat_map(|group| group.iter().copied()),
        )
    }
}

/// Filter chain for an SDR source: a plain conversion to the output format.
pub fn sdr_graph() -> FilterGraph {
    let mut graph = FilterGraph::new();
    graph.push(FilterStage::format(OUTPUT_PIXEL_FORMAT));
    graph
}

/// Filter chain for an HDR source.
///
/// `peak_fragment` is a `:peak=N` parameter (or empty); it is only applied for
/// variants that accept an external peak.
pub fn hdr_graph(variant: PipelineVariant, tonemap: Tonemap, peak_fragment: &str) -> FilterGraph {
    let mut graph = FilterGraph::new();

    if tonemap == Tonemap::None {
        graph.push(variant.stage(&[variant.input_params(), variant.output_params()]));
        graph.push(FilterStage::format(OUTPUT_PIXEL_FORMAT));
        return graph;
    }

    let mut tonemap_params = vec![tonemap.as_str().to_string()];
    if variant.uses_external_peak() {
        let peak = peak_fragment.trim_start_matches(':');
        if !peak.is_empty() {
            tonemap_params.push(peak.to_string());
        }
    }
    tonemap_params.push("desat=0".to_string());

    graph.push(FilterStage::format(WORKING_PIXEL_FORMAT));
    graph.push(variant.stage(&[variant.input_params(), variant.linear_params()]));
    graph.push(FilterStage::new("tonemap", tonemap_params));
    graph.push(variant.stage(&[variant.output_params()]));
    graph.push(FilterStage::format(OUTPUT_PIXEL_FORMAT));
    graph
}

pub struct FilterGraphBuilder<'a> {
    prober: &'a LuminancePeakProber,
}

impl<'a> FilterGraphBuilder<'a> {
    pub fn new(prober: &'a LuminancePeakProber) -> Self {
        Self { prober }
    }

    /// Builds the chain for one capture, probing the source peak only when the
    /// chosen variant tone-maps with an external peak.
    pub async fn build(
        &self,
        is_hdr: bool,
        source_path: &Path,
        tonemap: Tonemap,
        variant: PipelineVariant,
    ) -> FilterGraph {
        if !is_hdr {
            return sdr_graph();
        }

        let peak_fragment = if tonemap != Tonemap::None && variant.uses_external_peak() {
            self.prober.peak(source_path).await
        } else {
            String::new()
        };

        hdr_graph(variant, tonemap, &peak_fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::process::testing::ScriptedRunner;
    use crate::utils::FfmpegWrapper;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn prober(runner: Arc<ScriptedRunner>) -> LuminancePeakProber {
        let ffmpeg = FfmpegWrapper::new("ffmpeg".to_string(), "ffprobe".to_string(), runner);
        LuminancePeakProber::new(ffmpeg, 5)
    }

    #[test]
    fn test_stage_rendering() {
        assert_eq!(FilterStage::format("rgb24").to_string(), "format=rgb24");
        assert_eq!(FilterStage::new("showinfo", Vec::<String>::new()).to_string(), "showinfo");
        assert_eq!(
            FilterStage::new("tonemap", ["hable", "desat=0"]).to_string(),
            "tonemap=hable:desat=0"
        );
    }

    #[test]
    fn test_scale_tonemap_with_peak() {
        let graph = hdr_graph(PipelineVariant::Scale, Tonemap::Hable, ":peak=1.200");
        assert_eq!(
            graph.to_string(),
            "format=gbrpf32le,\
             scale=in_chroma_loc=topleft:out_transfer=linear,\
             tonemap=hable:peak=1.200:desat=0,\
             scale=out_primaries=bt709:out_transfer=bt709:out_color_matrix=bt709,\
             format=rgb24"
        );
    }

    #[test]
    fn test_scale_tonemap_without_peak() {
        let graph = hdr_graph(PipelineVariant::Scale, Tonemap::Reinhard, "");
        assert_eq!(graph.stages()[2].to_string(), "tonemap=reinhard:desat=0");
    }

    #[test]
    fn test_zscale_tonemap_ignores_peak() {
        let graph = hdr_graph(PipelineVariant::Zscale, Tonemap::Mobius, ":peak=4.000");
        assert_eq!(
            graph.to_string(),
            "format=gbrpf32le,zscale=t=linear,tonemap=mobius:desat=0,zscale=p=bt709:t=bt709:m=bt709,format=rgb24"
        );
    }

    #[test]
    fn test_tonemap_none_skips_linearization() {
        let scale = hdr_graph(PipelineVariant::Scale, Tonemap::None, ":peak=1.200");
        assert_eq!(
            scale.to_string(),
            "scale=in_chroma_loc=topleft:out_primaries=bt709:out_transfer=bt709:out_color_matrix=bt709,format=rgb24"
        );
        assert!(!scale.contains("tonemap"));

        let zscale = hdr_graph(PipelineVariant::Zscale, Tonemap::None, "");
        assert_eq!(zscale.to_string(), "zscale=p=bt709:t=bt709:m=bt709,format=rgb24");
    }

    #[tokio::test]
    async fn test_sdr_source_is_independent_of_settings() {
        let runner = Arc::new(ScriptedRunner::new());
        let prober = prober(runner.clone());
        let builder = FilterGraphBuilder::new(&prober);
        let source = Path::new("/videos/sdr.mkv");

        for variant in [PipelineVariant::Scale, PipelineVariant::Zscale] {
            for tonemap in Tonemap::all() {
                let graph = builder.build(false, source, *tonemap, variant).await;
                assert_eq!(graph.to_string(), "format=rgb24");
            }
        }
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_zscale_never_probes() {
        let runner = Arc::new(ScriptedRunner::new());
        let prober = prober(runner.clone());
        let builder = FilterGraphBuilder::new(&prober);

        let graph = builder
            .build(true, Path::new("/videos/hdr.mkv"), Tonemap::Hable, PipelineVariant::Zscale)
            .await;

        assert!(graph.contains("tonemap"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tonemap_none_never_probes() {
        let runner = Arc::new(ScriptedRunner::new());
        let prober = prober(runner.clone());
        let builder = FilterGraphBuilder::new(&prober);

        let graph = builder
            .build(true, Path::new("/videos/hdr.mkv"), Tonemap::None, PipelineVariant::Scale)
            .await;

        assert!(!graph.contains("tonemap"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scale_probes_and_applies_peak() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(0, &["MaxCLL=1200, MaxFALL=300"]);
        let prober = prober(runner.clone());
        let builder = FilterGraphBuilder::new(&prober);

        let graph = builder
            .build(true, Path::new("/videos/hdr.mkv"), Tonemap::Hable, PipelineVariant::Scale)
            .await;

        assert_eq!(graph.stages()[2].to_string(), "tonemap=hable:peak=1.200:desat=0");
        assert_eq!(runner.calls().len(), 1);
    }
}
