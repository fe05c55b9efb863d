use log::*;
use std::collections::HashSet;
use std::ffi::CStr;
use std::os::raw::c_void;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk;
use vulkanalia::vk::ExtDebugUtilsExtension;
use vulkanalia::vk::Handle;
use vulkanalia::Entry;
use vulkanalia::Instance;

use super::constants;
use crate::error::{Creating, RenderError};

#[derive(Debug)]
pub struct VulkanInstance {
    pub vk_instance: Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    validation: bool,
}

impl VulkanInstance {
    /// Creates the instance with the presentation extensions the window
    /// system needs, plus portability enumeration when the loader offers it.
    pub unsafe fn new(
        entry: &Entry,
        required_extensions: &[&vk::ExtensionName],
    ) -> Result<VulkanInstance, RenderError> {
        // Application Info
        let application_info = vk::ApplicationInfo::builder()
            .application_name(b"Trigon\0")
            .application_version(vk::make_version(1, 0, 0))
            .engine_name(b"Trigon\0")
            .engine_version(vk::make_version(1, 0, 0))
            .api_version(vk::make_version(1, 0, 0));

        // Layers
        let available_layers = entry
            .enumerate_instance_layer_properties()?
            .iter()
            .map(|l| l.layer_name)
            .collect::<HashSet<_>>();

        let validation = constants::VALIDATION_ENABLED
            && available_layers.contains(&constants::VALIDATION_LAYER);
        if constants::VALIDATION_ENABLED && !validation {
            warn!("Validation layer requested but not installed, continuing without it.");
        }

        let layers = if validation {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        // Extensions
        let available_extensions = entry
            .enumerate_instance_extension_properties(None)?
            .iter()
            .map(|e| e.extension_name)
            .collect::<HashSet<_>>();

        let mut extensions = required_extensions
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<_>>();

        let flags = if available_extensions.contains(&vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name)
        {
            info!("Enabling instance extensions for portability enumeration.");
            if available_extensions
                .contains(&vk::KHR_GET_PHYSICAL_DEVICE_PROPERTIES2_EXTENSION.name)
            {
                extensions.push(
                    vk::KHR_GET_PHYSICAL_DEVICE_PROPERTIES2_EXTENSION
                        .name
                        .as_ptr(),
                );
            }
            extensions.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name.as_ptr());
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::empty()
        };

        if validation {
            extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION.name.as_ptr());
        }

        // Create
        let mut info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .flags(flags);

        let mut debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::all())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .user_callback(Some(debug_callback));

        if validation {
            info = info.push_next(&mut debug_info);
        }

        let instance = entry.create_instance(&info, None).creating("instance")?;

        // Messenger
        let messenger = if validation {
            instance
                .create_debug_utils_messenger_ext(&debug_info, None)
                .creating("debug messenger")?
        } else {
            vk::DebugUtilsMessengerEXT::null()
        };

        debug!("Created Vulkan instance ({} extensions).", extensions.len());

        Ok(VulkanInstance {
            vk_instance: instance,
            messenger,
            validation,
        })
    }

    pub fn validation_enabled(&self) -> bool {
        self.validation
    }

    pub unsafe fn destroy(&mut self) {
        if !self.messenger.is_null() {
            self.vk_instance
                .destroy_debug_utils_messenger_ext(self.messenger, None);
        }
        self.vk_instance.destroy_instance(None);
    }
}

extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    type_: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let data = unsafe { *data };
    let message = unsafe { CStr::from_ptr(data.message) }.to_string_lossy();

    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        error!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        warn!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        debug!("({:?}) {}", type_, message);
    } else {
        trace!("({:?}) {}", type_, message);
    }

    vk::FALSE
}
