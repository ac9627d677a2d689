//! Output device selection per route

use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle};

use crate::application::ports::PlaybackError;
use crate::domain::session::OutputRoute;

/// Output device names for each route. Unset or missing devices fall back
/// to the system default output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDevices {
    speaker: Option<String>,
    earpiece: Option<String>,
}

impl OutputDevices {
    pub fn new(speaker: Option<String>, earpiece: Option<String>) -> Self {
        Self { speaker, earpiece }
    }

    pub fn device_name(&self, route: OutputRoute) -> Option<&str> {
        match route {
            OutputRoute::Speaker => self.speaker.as_deref(),
            OutputRoute::Earpiece => self.earpiece.as_deref(),
        }
    }

    /// Check whether both routes resolve to the same configured device
    pub fn shares_output(&self, a: OutputRoute, b: OutputRoute) -> bool {
        self.device_name(a) == self.device_name(b)
    }

    /// Open an output stream for `route`
    pub fn open(
        &self,
        route: OutputRoute,
    ) -> Result<(OutputStream, OutputStreamHandle), PlaybackError> {
        if let Some(name) = self.device_name(route) {
            match find_output_device(name) {
                Some(device) => match OutputStream::try_from_device(&device) {
                    Ok(output) => return Ok(output),
                    Err(e) => {
                        tracing::warn!(device = name, %route, error = %e, "Output device failed, using default")
                    }
                },
                None => tracing::warn!(device = name, %route, "Output device not found, using default"),
            }
        }

        OutputStream::try_default().map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))
    }
}

fn find_output_device(name: &str) -> Option<rodio::cpal::Device> {
    rodio::cpal::default_host()
        .output_devices()
        .ok()?
        .find(|device| device.name().is_ok_and(|n| n == name))
}
