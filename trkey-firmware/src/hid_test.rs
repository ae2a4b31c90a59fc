use embassy_futures::block_on;

use crate::usb_test_stub::{test_hid_writer, TestEndpointIn};

use super::*;

extern crate std;
use std::vec;

#[test]
fn descriptor_ids_match_reports() {
    assert_eq!(&REPORT_DESCRIPTOR[6..8], &[0x85, KEYBOARD_REPORT_ID]);
    assert_eq!(&REPORT_DESCRIPTOR[59 + 6..59 + 8], &[0x85, CONSUMER_REPORT_ID]);
    assert_eq!(&REPORT_DESCRIPTOR[84 + 6..84 + 8], &[0x85, MOUSE_REPORT_ID]);
    assert_eq!(REPORT_DESCRIPTOR[58], 0xC0);
    assert_eq!(REPORT_DESCRIPTOR[83], 0xC0);
    assert_eq!(REPORT_DESCRIPTOR[REPORT_DESCRIPTOR.len() - 1], 0xC0);
}

#[test]
fn short_report_is_one_packet() {
    let (mut writer, packets, _) = test_hid_writer();
    block_on(writer.write_report(&[4, 0xcd, 0])).unwrap();
    assert_eq!(packets.take(), vec![vec![4, 0xcd, 0]]);
}

#[test]
fn long_report_is_split() {
    let ep_in = TestEndpointIn::with_packet_size(16);
    let packets = ep_in.packets.clone();
    let mut writer = HidWriter::<_, MAX_REPORT_LEN>::new(ep_in);

    let report: [u8; MAX_REPORT_LEN] = core::array::from_fn(|i| i as u8);
    block_on(writer.write(&report)).unwrap();

    let sent = packets.take();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].len(), 16);
    assert_eq!(sent[2], &report[32..]);
}

#[test]
fn short_multiple_of_packet_size_sends_zlp() {
    let ep_in = TestEndpointIn::with_packet_size(16);
    let packets = ep_in.packets.clone();
    let mut writer = HidWriter::<_, MAX_REPORT_LEN>::new(ep_in);

    block_on(writer.write(&[1; 16])).unwrap();
    let sent = packets.take();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].is_empty());
}

#[test]
fn oversized_report() {
    let (mut writer, packets, _) = test_hid_writer();
    assert_eq!(
        block_on(writer.write_report(&[0; MAX_REPORT_LEN + 1])),
        Err(OutputError::BufferOverflow)
    );
    assert!(packets.is_empty());
}

#[test]
fn disabled_endpoint() {
    let (mut writer, _, disabled) = test_hid_writer();
    disabled.set(true);
    assert_eq!(
        block_on(writer.write_report(&[4, 0, 0])),
        Err(OutputError::Disabled)
    );
}
