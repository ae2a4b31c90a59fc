use embassy_futures::block_on;

use crate::{
    config::load_layers,
    flash_test_stub::NorFlashStub,
    layers::LayerSet,
    norflash_fs::test::{read_all, write_all, TestFs},
    serial_test_stub::TestPort,
};

use super::*;

extern crate std;
use std::vec::Vec;

#[derive(Default)]
struct Target {
    layers: Option<LayerSet>,
    now_playing: NowPlaying,
    reloads: usize,
    refreshes: usize,
}

impl ControlTarget for Target {
    fn reload_layers(&mut self, fs: &dyn FileStore) -> Result<(), ConfigError> {
        self.reloads += 1;
        let mut buf = [0; 512];
        let result = load_layers(fs, &mut buf);
        match result {
            Ok(set) => {
                self.layers = Some(set);
                Ok(())
            }
            Err(err) => {
                self.layers = Some(LayerSet::fallback());
                Err(err)
            }
        }
    }

    fn now_playing(&mut self) -> &mut NowPlaying {
        &mut self.now_playing
    }

    fn request_refresh(&mut self) {
        self.refreshes += 1;
    }
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

macro_rules! setup {
    ($fs:ident, $port:ident, $channel:ident, $target:ident, $x:tt) => {
        setup!(ControlConfig::default(), $fs, $port, $channel, $target, $x)
    };
    ($config:expr, $fs:ident, $port:ident, $channel:ident, $target:ident, $x:tt) => {{
        let mut stub = NorFlashStub::default();
        let $fs = TestFs::new(&mut stub);
        let $port = TestPort::default();
        let mut $channel = ControlChannel::new($port.clone(), $config);
        let mut $target = Target::default();
        block_on(async { $x })
    }};
}

#[test]
fn upload_then_command_in_same_chunk() {
    setup!(fs, port, channel, target, {
        channel
            .feed(&fs, &mut target, at(0), b"PUT a.txt\nhello<EOF>LIST\n")
            .await;
        assert_eq!(
            port.take_string(),
            "READY\nFILE RECEIVED\nFiles:\na.txt\n<END>\n"
        );
        assert_eq!(read_all(&fs, "a.txt").unwrap(), b"hello");
        assert!(!channel.is_receiving());
        assert_eq!(target.reloads, 0);
    });
}

#[test]
fn sentinel_split_across_reads() {
    setup!(fs, port, channel, target, {
        channel.feed(&fs, &mut target, at(0), b"PUT b.txt\n").await;
        for chunk in [
            &b"abc<E"[..],
            &b"O"[..],
            &b"x<<EO"[..],
            &b"F"[..],
            &b">LI"[..],
            &b"ST\n"[..],
        ] {
            channel.feed(&fs, &mut target, at(0), chunk).await;
        }
        assert_eq!(
            port.take_string(),
            "READY\nFILE RECEIVED\nFiles:\nb.txt\n<END>\n"
        );
        assert_eq!(read_all(&fs, "b.txt").unwrap(), b"abc<EOx<");
    });
}

#[test]
fn upload_through_poll() {
    setup!(fs, port, channel, target, {
        let mut upload = Vec::from(&b"PUT big.bin\n"[..]);
        upload.extend((0..300).map(|i| b'a' + (i % 26) as u8));
        upload.extend_from_slice(b"<EOF>");
        port.send(&upload);

        channel.poll(&fs, &mut target, at(0)).await;
        assert_eq!(port.take_string(), "READY\nFILE RECEIVED\n");
        assert_eq!(read_all(&fs, "big.bin").unwrap(), &upload[12..312]);
        assert_eq!(port.pending(), 0);
    });
}

#[test]
fn layers_upload_reloads() {
    setup!(fs, port, channel, target, {
        channel
            .feed(
                &fs,
                &mut target,
                at(0),
                br#"PUT layers.json
{"layers": [{"name": "New", "keys": ["A"]}]}<EOF>"#,
            )
            .await;
        assert_eq!(
            port.take_string(),
            "READY\nFILE RECEIVED\nLAYERS RELOADED\n"
        );
        assert_eq!(target.reloads, 1);
        assert_eq!(target.layers.as_ref().unwrap().layer(0).name, "New");
    });
}

#[test]
fn bad_layers_upload_installs_error_layer() {
    setup!(fs, port, channel, target, {
        channel
            .feed(&fs, &mut target, at(0), b"PUT layers.json\n{\"layers\": []}<EOF>")
            .await;
        assert_eq!(
            port.take_string(),
            "READY\nFILE RECEIVED\nLAYERS RELOADED\n"
        );
        assert_eq!(target.reloads, 1);
        assert_eq!(target.layers, Some(LayerSet::fallback()));
    });
}

#[test]
fn reload_command() {
    setup!(fs, port, channel, target, {
        channel.feed(&fs, &mut target, at(0), b"RELOAD\n").await;
        assert_eq!(port.take_string(), "LAYERS RELOADED\n");
        assert_eq!(target.layers, Some(LayerSet::fallback()));

        write_all(&fs, LAYERS_FILE, br#"{"layers": [{"name": "Main"}]}"#);
        channel.feed(&fs, &mut target, at(0), b"RELOAD\r\n").await;
        assert_eq!(port.take_string(), "LAYERS RELOADED\n");
        assert_eq!(target.layers.as_ref().unwrap().layer(0).name, "Main");
        assert_eq!(target.reloads, 2);
        assert_eq!(target.refreshes, 2);
    });
}

#[test]
fn too_large_upload_is_not_kept() {
    setup!(fs, port, channel, target, {
        channel.feed(&fs, &mut target, at(0), b"PUT huge.bin\n").await;
        let data = [b'x'; 600];
        channel.feed(&fs, &mut target, at(0), &data).await;
        channel.feed(&fs, &mut target, at(0), b"<EOF>LIST\n").await;
        assert_eq!(
            port.take_string(),
            "READY\nERROR: file too large\nFiles:\n<END>\n"
        );
    });
}

#[test]
fn list_get_del() {
    setup!(fs, port, channel, target, {
        write_all(&fs, "one.txt", b"first");
        write_all(&fs, "two.txt", b"second");

        channel.feed(&fs, &mut target, at(0), b"LIST\n").await;
        assert_eq!(port.take_string(), "Files:\none.txt\ntwo.txt\n<END>\n");

        channel.feed(&fs, &mut target, at(0), b"GET two.txt\n").await;
        assert_eq!(port.take_string(), "second<EOF>\n");

        channel.feed(&fs, &mut target, at(0), b"DEL one.txt\n").await;
        assert_eq!(port.take_string(), "DELETED\n");
        assert_eq!(read_all(&fs, "one.txt"), Err(FsError::FileNotFound));

        channel.feed(&fs, &mut target, at(0), b"DEL one.txt\nGET one.txt\n").await;
        assert_eq!(
            port.take_string(),
            "ERROR: file not found\nERROR: file not found\n"
        );
    });
}

#[test]
fn get_streams_file_then_eof() {
    setup!(fs, port, channel, target, {
        let data: Vec<u8> = (0..440).map(|i| (i % 251) as u8).collect();
        write_all(&fs, "data.bin", &data);

        channel.feed(&fs, &mut target, at(0), b"GET data.bin\n").await;
        let mut expected = data.clone();
        expected.extend_from_slice(b"<EOF>\n");
        assert_eq!(port.take(), expected);
    });
}

#[test]
fn put_errors() {
    setup!(fs, port, channel, target, {
        channel.feed(&fs, &mut target, at(0), b"PUT bad name\n").await;
        assert_eq!(port.take_string(), "ERROR: invalid file name\n");
        assert!(!channel.is_receiving());
    });
}

#[test]
fn unknown_and_empty_commands() {
    setup!(fs, port, channel, target, {
        channel
            .feed(&fs, &mut target, at(0), b"\n\r\n  \nFOO\nLIST extra\nDEL\nlist\n")
            .await;
        assert_eq!(
            port.take_string(),
            "UNKNOWN COMMAND\nUNKNOWN COMMAND\nUNKNOWN COMMAND\nUNKNOWN COMMAND\n"
        );
    });
}

#[test]
fn line_too_long() {
    setup!(fs, port, channel, target, {
        let long = [b'A'; MAX_LINE_LEN + 1];
        channel.feed(&fs, &mut target, at(0), &long).await;
        channel.feed(&fs, &mut target, at(0), b"\nLIST\n").await;
        assert_eq!(port.take_string(), "ERROR: line too long\nFiles:\n<END>\n");
    });
}

#[test]
fn now_playing_commands() {
    setup!(fs, port, channel, target, {
        channel
            .feed(
                &fs,
                &mut target,
                at(1000),
                br#"NP_SET {"title":"X","artist":"Y","position":5,"duration":200,"source":"S"}
NP_GET
"#,
            )
            .await;
        assert_eq!(
            port.take_string(),
            "NP_OK\n{\"title\":\"X\",\"artist\":\"Y\",\"position\":5,\"duration\":200,\"source\":\"S\"}\n"
        );
        assert_eq!(target.refreshes, 1);

        let timeout = embassy_time::Duration::from_secs(10);
        assert!(target.now_playing.is_showing(at(11_000), timeout));
        assert!(!target.now_playing.is_showing(at(11_001), timeout));

        channel
            .feed(&fs, &mut target, at(2000), b"NP_SET {bad json\n")
            .await;
        let reply = port.take_string();
        assert!(reply.starts_with("ERROR: "), "{}", reply);
        assert!(reply.ends_with('\n'));
        assert_eq!(target.now_playing.track().title, "X");

        channel.feed(&fs, &mut target, at(3000), b"NP_CLEAR\n").await;
        assert_eq!(port.take_string(), "NP_CLEARED\n");
        assert!(!target.now_playing.is_showing(at(3000), timeout));
        assert_eq!(target.refreshes, 2);
    });
}

#[test]
fn now_playing_escapes() {
    setup!(fs, port, channel, target, {
        channel
            .feed(
                &fs,
                &mut target,
                at(0),
                b"NP_SET {\"title\":\"Beyonc\\u00e9 \\\"Live\\\"\"}\nNP_GET\n",
            )
            .await;
        assert_eq!(target.now_playing.track().title, "Beyonc\u{e9} \"Live\"");
        assert_eq!(
            port.take_string(),
            "NP_OK\n{\"title\":\"Beyonc\u{e9} \\\"Live\\\"\",\"artist\":\"\",\"position\":0,\"duration\":0,\"source\":\"\"}\n"
        );
    });
}

#[test]
fn companion_link() {
    setup!(fs, port, channel, target, {
        channel.send_app_event("APP_NEXT").await.unwrap();
        assert!(port.take().is_empty());

        channel.feed(&fs, &mut target, at(0), b"LIST\n").await;
        port.take();
        assert!(channel.is_connected());
        channel.send_app_event("APP_NEXT").await.unwrap();
        assert_eq!(port.take_string(), "APP_EVENT APP_NEXT\n");
    });
}

#[test]
fn handshake_required() {
    let config = ControlConfig {
        require_handshake: true,
    };
    setup!(config, fs, port, channel, target, {
        channel.feed(&fs, &mut target, at(0), b"LIST\n").await;
        assert!(!channel.is_connected());

        channel.feed(&fs, &mut target, at(0), b"HELLO\n").await;
        assert_eq!(port.take_string(), "Files:\n<END>\nHELLO\n");
        assert!(channel.is_connected());
    });
}

#[test]
fn write_failure_is_not_fatal() {
    setup!(fs, port, channel, target, {
        port.broken.set(true);
        channel.feed(&fs, &mut target, at(0), b"LIST\n").await;
        assert_eq!(
            channel.send_app_event("APP_MUTE").await,
            Err(PortError::Disconnected)
        );

        port.broken.set(false);
        channel.feed(&fs, &mut target, at(0), b"NP_CLEAR\n").await;
        assert_eq!(port.take_string(), "NP_CLEARED\n");
    });
}
