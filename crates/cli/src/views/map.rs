use std::io::{self, Write};

use doors_client::{ClientError, SessionManager};
use doors_core::format;
use doors_core::map::MarkerLayer;
use doors_core::models::Door;

use super::ViewState;

/// Marker listing of every door. The layer is rebuilt on each load.
#[derive(Debug, Default)]
pub struct MapView {
    pub layer: MarkerLayer,
    pub state: ViewState<usize>,
}

impl MapView {
    pub fn new(layer: MarkerLayer) -> Self {
        Self {
            layer,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self, session: &SessionManager) {
        let result = fetch(session).await.map(|doors| {
            self.layer.sync(&doors);
            self.layer.len()
        });
        self.state = ViewState::from_result(result);
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        self.state.render_with(out, |out, count| {
            writeln!(out, "Map: {count} marker(s)")?;
            writeln!(out, "Centre: {}", format::coordinates(&self.layer.center()))?;
            if let Some(bounds) = self.layer.bounds() {
                writeln!(
                    out,
                    "Bounds: lat {:.5}..{:.5}, lon {:.5}..{:.5}",
                    bounds.south, bounds.north, bounds.west, bounds.east
                )?;
            }
            for line in self.layer.describe() {
                writeln!(out, "  {line}")?;
            }
            Ok(())
        })
    }

    /// Write the marker set as a GeoJSON `FeatureCollection`.
    pub fn render_geojson(&self, out: &mut impl Write) -> io::Result<()> {
        if let ViewState::Failed(message) = &self.state {
            return super::render_toast(out, message);
        }
        serde_json::to_writer_pretty(&mut *out, &self.layer.to_geojson())?;
        writeln!(out)
    }
}

async fn fetch(session: &SessionManager) -> Result<Vec<Door>, ClientError> {
    let token = session.require_token().await?;
    session.api().list_doors(&token, None).await
}
