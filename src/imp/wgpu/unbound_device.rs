// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::wgpu::EntryPoint;

pub struct UnboundDevice {
    pub(super) adapter: wgpu::Adapter,
}

impl UnboundDevice {
    /// Picks a compute-capable adapter.  There is no surface; the pass is headless.
    pub async fn pick(entry_point: &EntryPoint) -> Result<UnboundDevice, super::Error> {
        let options = wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = entry_point
            .0
            .request_adapter(&options)
            .await
            .map_err(super::Error::NoSuchAdapter)?;

        let info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(super::Error::NoComputeSupport { adapter: info.name });
        }
        logwise::info_sync!(
            "picked adapter {name} on {backend}",
            name = info.name.clone(),
            backend = logwise::privacy::LogIt(&info.backend)
        );
        Ok(UnboundDevice { adapter })
    }
}
