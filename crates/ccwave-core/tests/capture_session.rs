use ccwave_core::{CaptureFormat, CaptureReader, Session, Settings};
use ccwave_decode::FrameKind;

fn logging_setup() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Reset, radio configuration burst, a FIFO load and a state poll, with
/// chip-select framing rows interleaved the way the analyzer exports them.
const CAPTURE: &str = "\
name,type,start_time,duration,mosi,miso
SPI,enable,0.000000,0,,
SPI,result,0.000010,0.000002,0x30,0x0F
SPI,disable,0.000012,0,,
SPI,result,0.001000,0.000002,0x4D,0x0F
SPI,result,0.001003,0.000002,0x23,0x0F
SPI,result,0.001006,0.000002,0x31,0x0F
SPI,result,0.001009,0.000002,0x3B,0x0F
SPI,result,0.001012,0.000002,0xC8,0x0F
SPI,result,0.001015,0.000002,0x75,0x0F
SPI,result,0.001018,0.000002,0x13,0x0F
SPI,result,0.001021,0.000002,0x22,0x0F
SPI,result,0.001024,0.000002,0xF8,0x0F
SPI,result,0.001027,0.000002,0x47,0x0F
SPI,result,0.002000,0.000002,0x7F,0x0F
SPI,result,0.002003,0.000002,0x4E,0x0F
SPI,result,0.002006,0.000002,0x03,0x0F
SPI,result,0.003000,0.000002,0xF5,0x0F
SPI,result,0.003003,0.000002,0x00,0x13
SPI,result,0.004000,0.000002,0x36,0x0F
";

fn decode(settings: Settings) -> (Session, Vec<String>) {
    logging_setup();
    let mut session = Session::new(settings.resolve(), 1000);
    let mut texts = Vec::new();
    for transfer in CaptureReader::new(CAPTURE.as_bytes(), CaptureFormat::Csv) {
        if let Some(frame) = session.feed(&transfer.unwrap()) {
            texts.push(frame.text);
        }
    }
    texts.extend(session.finish().map(|frame| frame.text));
    (session, texts)
}

#[test]
fn decodes_full_capture() {
    let (session, texts) = decode(Settings::default());
    assert_eq!(
        texts,
        [
            "CMD SRES",
            "W FREQ2 :23 FREQ1 :31 FREQ0 .FREQ:914999969 MDMCFG4 :C8 MDMCFG3 .DATARATE:9248 \
             MDMCFG2 .MOD_FORMAT:GFSK .SYNC_MODE:0x3 MDMCFG1 .NUM_PREAMBLE:4  \
             MDMCFG0 .CHANSPC:199951 DEVIATN .DEV:47607",
            "W TXFIFO 4E 03",
            "R MARCSTATE TX",
            "CMD SIDLE",
        ]
    );
    assert!(session
        .log()
        .entries()
        .iter()
        .all(|entry| entry.frame.kind == FrameKind::Message));
}

#[test]
fn trace_filter_matches_frequency_and_fifo_writes() {
    let (mut session, _) = decode(Settings::default());
    session
        .log_mut()
        .set_filter(vec!["FREQ".into(), "TXFIFO".into()], vec!["UNDER".into()]);
    let trace = session.log().to_text(true);
    let lines: Vec<_> = trace.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("0.99ms W FREQ2 :23"));
    assert_eq!(lines[1], "1.99ms W TXFIFO 4E 03");
}

#[test]
fn wide_timeout_merges_everything() {
    let settings = Settings {
        packet_timeout_us: 1000.0,
        ..Default::default()
    };
    let (_, texts) = decode(settings);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("W SRES:4D"));
}
