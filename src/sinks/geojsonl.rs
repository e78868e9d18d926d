use super::{DataSink, FeatureRow, to_feature};
use anyhow::{Context, Result};
use geojson::GeoJson;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One GeoJSON feature per line.
pub struct GeoJsonlSink {
    writer: BufWriter<File>,
}

impl GeoJsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("Sink: Failed to create {:?}", path))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl DataSink for GeoJsonlSink {
    fn add_feature(&mut self, row: FeatureRow) -> Result<()> {
        let geojson = GeoJson::Feature(to_feature(row));
        serde_json::to_writer(&mut self.writer, &geojson)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
