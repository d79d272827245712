#![no_main]
use libfuzzer_sys::fuzz_target;
use shellypv::mapper::{PhaseConfig, compute_frame};
use shellypv::shelly::{EnergySnapshot, StatusSnapshot, parse_energy, parse_identity, parse_status};

fuzz_target!(|data: &[u8]| {
    // Every parser must reject garbage with an error, never a panic
    let _ = parse_identity(data);
    let status = parse_status(data);
    let energy = parse_energy(data);

    // Whatever parses must map cleanly
    if status.is_ok() || energy.is_ok() {
        let status = status.unwrap_or_else(|_| StatusSnapshot::default());
        let energy = energy.unwrap_or_else(|_| EnergySnapshot::default());
        let index = data.first().copied().unwrap_or(0);
        let frame = compute_frame(&PhaseConfig::default(), &status, &energy, index);
        assert_eq!(frame.update_index, index.wrapping_add(1));
    }
});
