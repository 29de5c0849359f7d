use comms::{
    Deserialize, Serialize,
    msg::{Command, Msg, Payload},
    specs::rollout::{ResultBundle, RolloutResult},
};
use tokio::io;

struct MyStr<'a>(&'a str);

impl<'a> Serialize<'a> for MyStr<'_> {
    fn serialize(&'a self, _buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        Some(self.0.as_bytes())
    }
}

impl<'a> Deserialize<'a> for MyStr<'a> {
    fn deserialize(buf: &'a mut [u8]) -> std::io::Result<Self> {
        str::from_utf8(buf)
            .map(Self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[tokio::test]
async fn send_recv() {
    const SIZE: usize = 128;

    let msg = MyStr("Hello, world!");

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    tx.send(&msg).await.unwrap();

    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);

    let s: MyStr = rx.recv().await.unwrap();

    assert_eq!(msg.0, s.0);
}

#[tokio::test]
async fn params_then_results_round() {
    let (coord, worker) = io::duplex(4096);
    let (rx, tx) = io::split(coord);
    let (mut coord_rx, mut coord_tx) = comms::channel(rx, tx);
    let (rx, tx) = io::split(worker);
    let (mut worker_rx, mut worker_tx) = comms::channel(rx, tx);

    let theta = [0.25_f32, -0.5, 1.0, 0.0];
    coord_tx.send(&Msg::Data(Payload::Params(&theta))).await.unwrap();

    let received = match worker_rx.recv().await.unwrap() {
        Msg::Data(Payload::Params(params)) => params.to_vec(),
        other => panic!("unexpected msg: {other:?}"),
    };
    assert_eq!(received, theta);

    let mut bundle = ResultBundle::new(1, 0);
    bundle.push(RolloutResult::Perturbation {
        noise_index: 10,
        return_pos: 2.0,
        return_neg: -2.0,
        sign_return_pos: 2.0,
        sign_return_neg: -2.0,
        length_pos: 2,
        length_neg: 2,
    });
    worker_tx
        .send(&Msg::Control(Command::Results(bundle.clone())))
        .await
        .unwrap();

    match coord_rx.recv().await.unwrap() {
        Msg::Control(Command::Results(got)) => assert_eq!(got, bundle),
        other => panic!("unexpected msg: {other:?}"),
    }
}

#[tokio::test]
async fn error_text_is_delivered() {
    let (one, two) = io::duplex(256);
    let (_, tx) = io::split(one);
    let (rx, _) = io::split(two);
    let (_, mut tx) = comms::channel(io::empty(), tx);
    let (mut rx, _) = comms::channel(rx, io::sink());

    tx.send(&Msg::Err("environment exploded".into())).await.unwrap();

    match rx.recv().await.unwrap() {
        Msg::Err(text) => assert_eq!(text, "environment exploded"),
        other => panic!("unexpected msg: {other:?}"),
    }
}

#[tokio::test]
async fn receive_buffer_is_reused_across_frame_sizes() {
    let (one, two) = io::duplex(4096);
    let (_, tx) = io::split(one);
    let (rx, _) = io::split(two);
    let (_, mut tx) = comms::channel(io::empty(), tx);
    let (mut rx, _) = comms::channel(rx, io::sink());

    let long: Vec<f32> = (0..300).map(|i| i as f32 * 0.5).collect();
    let short = [7.0_f32, -7.0];

    tx.send(&Msg::Data(Payload::Params(&long))).await.unwrap();
    tx.send(&Msg::Err("odd".into())).await.unwrap();
    tx.send(&Msg::Data(Payload::Params(&short))).await.unwrap();

    match rx.recv().await.unwrap() {
        Msg::Data(Payload::Params(params)) => assert_eq!(params, long.as_slice()),
        other => panic!("unexpected msg: {other:?}"),
    }
    match rx.recv().await.unwrap() {
        Msg::Err(text) => assert_eq!(text, "odd"),
        other => panic!("unexpected msg: {other:?}"),
    }
    match rx.recv().await.unwrap() {
        Msg::Data(Payload::Params(params)) => assert_eq!(params, short.as_slice()),
        other => panic!("unexpected msg: {other:?}"),
    }
}
