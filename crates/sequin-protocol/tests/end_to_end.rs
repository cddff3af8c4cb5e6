//! Client-to-server sequencing through an ordered context.
//!
//! Two calling threads race 1000 submissions into one ordered context.
//! Sequence assignment happens inside the context's tasks, so assignment
//! order equals execution order equals enqueue order; the server-side buffer
//! must then accept the resulting stream without a single gap or duplicate.

use std::sync::{Arc, Mutex};

use sequin_protocol::{
    Admission, CommandRequest, SequenceAssigner, SequenceBuffer, SequenceNumber, Sequenced,
    SessionId,
};
use sequin_runtime::{ExecutionContextExt, OrderedContext, TokioPool};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sequences_are_assigned_and_dispatched_in_enqueue_order() {
    let ctx = OrderedContext::new(Arc::new(TokioPool::current()));
    let session = SessionId::new(1);

    // Owned by the session layer; only ever touched from inside the
    // session's own ordered context, so access is serialized by the context.
    let assigner = Arc::new(Mutex::new(SequenceAssigner::new()));
    let sent: Arc<Mutex<Vec<CommandRequest>>> = Arc::new(Mutex::new(Vec::new()));

    // Enqueue order is pinned down by tagging under a lock held across the
    // execute call; the payload carries the tag.
    let submit_lock = Arc::new(Mutex::new(0_u32));
    let mut producers = Vec::new();
    for _ in 0..2 {
        let ctx = ctx.clone();
        let assigner = Arc::clone(&assigner);
        let sent = Arc::clone(&sent);
        let submit_lock = Arc::clone(&submit_lock);
        producers.push(std::thread::spawn(move || {
            for _ in 0..500 {
                let mut next_tag = submit_lock.lock().unwrap();
                let tag = *next_tag;
                *next_tag += 1;
                let assigner = Arc::clone(&assigner);
                let sent = Arc::clone(&sent);
                ctx.execute_fn(move || {
                    let sequence = assigner.lock().unwrap().next();
                    let request = CommandRequest::builder()
                        .session(session)
                        .sequence(sequence)
                        .payload(tag.to_be_bytes().to_vec())
                        .build()
                        .unwrap();
                    sent.lock().unwrap().push(request);
                });
            }
        }));
    }
    for producer in producers {
        producer.join().unwrap();
    }
    ctx.submit(|| ()).await.unwrap();

    let sent = Arc::try_unwrap(sent).unwrap().into_inner().unwrap();
    assert_eq!(sent.len(), 1000);
    for (index, request) in sent.iter().enumerate() {
        assert_eq!(request.sequence(), SequenceNumber::new(index as u64));
        assert_eq!(request.payload(), (index as u32).to_be_bytes());
    }

    // The server side accepts the stream as-is: in order, gapless.
    let mut buffer = SequenceBuffer::new(16);
    for request in sent {
        let sequence = request.sequence();
        match buffer.offer(sequence, request).unwrap() {
            Admission::Ready(run) => assert_eq!(run.len(), 1),
            other => panic!("in-order stream produced {other:?}"),
        }
    }
    assert_eq!(buffer.next_expected(), SequenceNumber::new(1000));
}
