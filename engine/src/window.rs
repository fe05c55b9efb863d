use winit::dpi::LogicalSize;
use winit::error::OsError;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::config::Config;

/// What the window is opened with. The size never changes afterwards, so the
/// swapchain is built once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowSpec {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.title.clone(),
            width: config.window_width,
            height: config.window_height,
        }
    }

    pub fn build(&self, event_loop: &EventLoop<()>) -> Result<Window, OsError> {
        WindowBuilder::new()
            .with_title(&self.title)
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_resizable(false)
            .build(event_loop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn window_follows_config() {
        let config = Config::parse(
            "windowWidth=800\nwindowHeight=600\ntitle=Demo\nrootDir=.\nspirvPath=./shaders",
        )
        .unwrap();

        let spec = WindowSpec::from_config(&config);

        assert_eq!(
            spec,
            WindowSpec {
                title: "Demo".to_string(),
                width: 800,
                height: 600,
            }
        );
        assert_eq!(config.spirv_path, Path::new("./shaders"));
    }
}
