//! End-to-end polling against the in-memory driver, through the public API only.

use wintab_access::{
    axis::{Range, Valuator},
    cursor::{
        Buttons, CursorId, CursorType, CSR_TYPE_GENERAL_PENERASER, CSR_TYPE_GENERAL_PENTIP,
        CSR_TYPE_GENERAL_PUCK,
    },
    tablet::DeviceId,
    virtual_tablet::{VirtualCursor, VirtualDevice, VirtualTablet},
    AccessError, Builder, DriverError, Manager, Packet,
};

fn setup() -> (VirtualTablet, DeviceId, DeviceId, Manager) {
    let tablet = VirtualTablet::new();
    let pen_tablet = tablet.add_device(
        VirtualDevice::new("Pen tablet")
            .valuator(Valuator::X, 0..=21600)
            .valuator(Valuator::Y, 0..=13500)
            .valuator(Valuator::Pressure, 0..=8191)
            .cursor(VirtualCursor::new("Pen", CSR_TYPE_GENERAL_PENTIP).physical_id(7))
            .cursor(VirtualCursor::new("Eraser", CSR_TYPE_GENERAL_PENERASER).physical_id(7)),
    );
    let digitizer = tablet.add_device(
        VirtualDevice::new("Digitizer")
            .valuator(Valuator::X, 0..=4000)
            .valuator(Valuator::Y, 0..=4000)
            .valuator(Valuator::Size, 1..=64)
            // A driver claiming an inverted range for pressure.
            .valuator(Valuator::Pressure, Range { min: 10, max: 0 })
            .cursor(VirtualCursor::new("Puck", CSR_TYPE_GENERAL_PUCK))
            .cursor(VirtualCursor::new("Mystery", 0x0123)),
    );
    let manager = Builder::new()
        .queue_size(Some(32))
        .max_devices(4)
        .build_virtual(tablet.clone());
    (tablet, pen_tablet, digitizer, manager)
}

fn stroke(cursor: u32, x: i32, pressure: i32) -> Packet {
    Packet {
        cursor: CursorId(cursor),
        buttons: if pressure > 0 {
            Buttons::PRIMARY
        } else {
            Buttons::empty()
        },
        x,
        y: x / 2,
        pressure,
        size: None,
    }
}

#[test]
fn a_stroke_is_read_in_order() {
    let (tablet, pen_tablet, _, mut manager) = setup();
    let cell = manager.open(pen_tablet).unwrap();
    for (i, pressure) in [0, 200, 4000, 8191, 0].into_iter().enumerate() {
        let x = i32::try_from(i).unwrap() * 100;
        assert_eq!(tablet.push(pen_tablet, stroke(0, x, pressure)), 1);
    }

    let access = manager.access_mut(cell).unwrap();
    let mut pressures = Vec::new();
    let mut held = Vec::new();
    assert_eq!(
        access.drain(|access| {
            pressures.push(access.value(Valuator::Pressure));
            held.push(access.buttons().contains(Buttons::PRIMARY));
        }),
        5
    );
    assert_eq!(pressures, [0, 200, 4000, 8191, 0]);
    assert_eq!(held, [false, true, true, true, false]);
    assert_eq!(access.value(Valuator::X), 400);
    assert_eq!(access.value(Valuator::Y), 200);
    assert_eq!(access.cursor(), CursorId(0));
}

#[test]
fn no_data_is_not_an_error_and_changes_nothing() {
    let (tablet, pen_tablet, _, mut manager) = setup();
    let cell = manager.open(pen_tablet).unwrap();
    tablet.push(pen_tablet, stroke(1, 55, 300));

    let access = manager.access_mut(cell).unwrap();
    assert!(access.next_packet());
    let snapshot = (*access.valuator_values(), access.cursor(), access.buttons());
    for _ in 0..3 {
        assert!(!access.next_packet());
        assert_eq!(
            (*access.valuator_values(), access.cursor(), access.buttons()),
            snapshot
        );
    }
}

#[test]
fn disabled_devices_report_no_data() {
    let (tablet, pen_tablet, _, mut manager) = setup();
    let cell = manager.open(pen_tablet).unwrap();
    tablet.push(pen_tablet, stroke(0, 1, 1));
    tablet.push(pen_tablet, stroke(0, 2, 2));

    let access = manager.access_mut(cell).unwrap();
    access.set_enabled(false);
    assert!(!access.enabled());
    assert!(!access.next_packet());
    assert_eq!(access.drain(|_| ()), 0);
    // The driver stops collecting as well.
    assert_eq!(tablet.push(pen_tablet, stroke(0, 3, 3)), 0);
    assert_eq!(manager.poll_all(), 0);

    let access = manager.access_mut(cell).unwrap();
    access.set_enabled(true);
    assert!(access.enabled());
    assert_eq!(access.drain(|_| ()), 2);
    assert_eq!(access.value(Valuator::X), 2);
}

#[test]
fn devices_start_disabled_when_asked() {
    let tablet = VirtualTablet::new();
    let device = tablet.add_device(VirtualDevice::new("Quiet"));
    let mut manager = Builder::new()
        .enable_on_open(false)
        .build_virtual(tablet.clone());
    let cell = manager.open(device).unwrap();
    assert!(!manager.access(cell).unwrap().enabled());
    assert_eq!(tablet.push(device, Packet::default()), 0);
}

#[test]
fn devices_are_independent() {
    let (tablet, pen_tablet, digitizer, mut manager) = setup();
    let pen_cell = manager.open(pen_tablet).unwrap();
    let digitizer_cell = manager.open(digitizer).unwrap();
    tablet.push(
        digitizer,
        Packet {
            size: Some(12),
            ..stroke(2, 3000, 5)
        },
    );

    assert_eq!(manager.poll_all(), 1);
    assert_eq!(manager.access(pen_cell).unwrap().value(Valuator::X), 0);
    let digitizer_access = manager.access(digitizer_cell).unwrap();
    assert_eq!(digitizer_access.value(Valuator::X), 3000);
    assert_eq!(digitizer_access.value(Valuator::Size), 12);
    assert_eq!(digitizer_access.cursor(), CursorId(2));
}

#[test]
fn valuator_ranges() {
    let (_, pen_tablet, digitizer, mut manager) = setup();
    let pen_cell = manager.open(pen_tablet).unwrap();
    let digitizer_cell = manager.open(digitizer).unwrap();

    let pen = manager.access(pen_cell).unwrap();
    assert_eq!(pen.valuator_range(Valuator::X).unwrap(), Range { min: 0, max: 21600 });
    assert_eq!(
        pen.valuator_range(Valuator::Pressure).unwrap(),
        Range { min: 0, max: 8191 }
    );
    assert!(matches!(
        pen.valuator_range(Valuator::Size),
        Err(AccessError::UnsupportedValuator {
            valuator: Valuator::Size,
            ..
        })
    ));

    let digitizer_access = manager.access(digitizer_cell).unwrap();
    assert_eq!(
        digitizer_access.valuator_range(Valuator::Size).unwrap(),
        Range { min: 1, max: 64 }
    );
    // Empty ranges count as unsupported.
    assert!(digitizer_access.valuator_range(Valuator::Pressure).is_err());
}

#[test]
fn cursor_ranges_are_contiguous_across_devices() {
    let (_, pen_tablet, digitizer, mut manager) = setup();
    let pen_cell = manager.open(pen_tablet).unwrap();
    let digitizer_cell = manager.open(digitizer).unwrap();

    let pen = manager.access(pen_cell).unwrap();
    let digitizer_access = manager.access(digitizer_cell).unwrap();
    assert_eq!(pen.first_cursor(), Some(CursorId(0)));
    assert_eq!(pen.cursors_count(), 2);
    assert_eq!(digitizer_access.first_cursor(), Some(CursorId(2)));
    assert_eq!(digitizer_access.cursors_count(), 2);

    let all: Vec<_> = pen
        .cursors()
        .into_iter()
        .chain(digitizer_access.cursors())
        .map(|cursor| cursor.0)
        .collect();
    assert_eq!(all, [0, 1, 2, 3]);

    let types: Vec<_> = all
        .iter()
        .map(|&id| manager.cursor_info(CursorId(id)).unwrap().cursor_type)
        .collect();
    assert_eq!(
        types,
        [
            CursorType::PenTip,
            CursorType::PenEraser,
            CursorType::Puck,
            CursorType::Undefined
        ]
    );
}

#[test]
fn cursor_activity_follows_the_driver() {
    let (tablet, _, _, manager) = setup();
    assert!(!manager.cursor_active(CursorId(1)));
    tablet.set_cursor_active(CursorId(1), true);
    assert!(manager.cursor_active(CursorId(1)));
    assert!(manager.cursor_info(CursorId(1)).unwrap().active);
    tablet.set_cursor_active(CursorId(1), false);
    assert!(!manager.cursor_active(CursorId(1)));
}

#[test]
fn table_capacity_and_reuse() {
    let (tablet, pen_tablet, digitizer, mut manager) = setup();
    let cells: Vec<_> = (0..4)
        .map(|i| manager.open(if i % 2 == 0 { pen_tablet } else { digitizer }).unwrap())
        .collect();
    assert_eq!(cells, [0, 1, 2, 3]);
    assert!(matches!(manager.open(pen_tablet), Err(AccessError::TableFull)));

    manager.close(2).unwrap();
    assert_eq!(tablet.open_contexts(), 3);
    assert_eq!(manager.open(digitizer).unwrap(), 2);
    assert_eq!(manager.accesses().count(), 4);
    assert!(matches!(manager.access(9), Err(AccessError::InvalidCell(9))));
}

#[test]
fn overflowing_queue_drops_newest() {
    let tablet = VirtualTablet::new();
    let device = tablet.add_device(VirtualDevice::new("Small"));
    let mut manager = Builder::new().queue_size(Some(2)).build_virtual(tablet.clone());
    let cell = manager.open(device).unwrap();
    for x in 0..5 {
        tablet.push(device, stroke(0, x, 1));
    }
    assert_eq!(tablet.dropped_packets(), 3);
    let access = manager.access_mut(cell).unwrap();
    let mut xs = Vec::new();
    access.drain(|access| xs.push(access.value(Valuator::X)));
    assert_eq!(xs, [0, 1]);
}

#[test]
fn refused_queue_sizes_are_negotiated_down() {
    let tablet = VirtualTablet::new();
    let device = tablet.add_device(VirtualDevice::new("Stingy"));
    tablet.set_max_queue_size(Some(20));
    // Asks for the default 128 first.
    let mut manager = Builder::new().build_virtual(tablet.clone());
    let cell = manager.open(device).unwrap();
    for x in 0..40 {
        tablet.push(device, stroke(0, x, 1));
    }
    assert_eq!(tablet.dropped_packets(), 24);
    assert_eq!(manager.access_mut(cell).unwrap().drain(|_| ()), 16);

    tablet.set_max_queue_size(Some(0));
    assert!(matches!(
        manager.open(device),
        Err(AccessError::Driver(DriverError::OpenFailed(_)))
    ));
    // The failed open took no cell.
    assert_eq!(manager.accesses().count(), 1);
    assert_eq!(tablet.open_contexts(), 1);
}
