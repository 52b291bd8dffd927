#![no_main]

use formgrid_layout::{FieldRecord, Grid, inspect_records};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let Ok(records) = serde_json::from_slice::<Vec<FieldRecord>>(data) else {
        return;
    };

    // Inspection never panics, whatever the input.
    let report = inspect_records(&records);

    match Grid::from_records(records) {
        Ok(grid) => {
            // Loading repairs everything except duplicate identities.
            let saved = grid.to_records();
            let after = inspect_records(&saved);
            assert!(after.is_clean(), "loaded layout still dirty: {:?}", after.issues);
            let reloaded = Grid::from_records(saved).expect("saved layout reloads");
            assert_eq!(reloaded.layout_hash(), grid.layout_hash());
        }
        Err(_) => assert!(report.has_unrepairable_errors()),
    }
});
