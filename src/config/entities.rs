//! Default hub address and entity identifiers (OctoPrint integration naming).

/// Hub base URL without trailing slash.
pub const HUB_BASE_URL: &str = "http://homeassistant.local:8123";

// Cameras
pub const CAMERA_1: &str = "camera.octoprint_camera_downscaled";
pub const CAMERA_2: &str = "camera.secondary_camera_downscaled";

// Sensors
pub const PROGRESS: &str = "sensor.octoprint_job_percentage";
pub const FINISH_TIME: &str = "sensor.octoprint_estimated_finish_time";
pub const BED_TEMP: &str = "sensor.octoprint_actual_bed_temp";
pub const TOOL_TEMP: &str = "sensor.octoprint_actual_tool0_temp";
pub const PRINTING: &str = "binary_sensor.octoprint_printing";

// Buttons
pub const BUTTON_PAUSE: &str = "button.octoprint_pause_job";
pub const BUTTON_RESUME: &str = "button.octoprint_resume_job";
pub const BUTTON_CANCEL: &str = "button.octoprint_stop_job";
