// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
#[derive(Debug)]
pub struct EntryPoint(pub(super) wgpu::Instance);
impl EntryPoint {
    /// Honors `WGPU_BACKEND` and friends, so a headless host can force e.g. a software Vulkan driver.
    pub async fn new() -> Result<Self, crate::imp::wgpu::Error> {
        let descriptor = wgpu::InstanceDescriptor::from_env_or_default();
        logwise::trace_sync!(
            "creating instance for backends {backends}",
            backends = logwise::privacy::LogIt(&descriptor.backends)
        );
        let wgpu_instance = wgpu::Instance::new(&descriptor);
        Ok(EntryPoint(wgpu_instance))
    }
}
