//! Generated gRPC types for the `neuronai.v1` package.
//!
//! Re-exported at the crate root so callers write `neuron_proto::ChatRequest`
//! and `neuron_proto::ai_service_server::AiServiceServer`.

tonic::include_proto!("neuronai.v1");
