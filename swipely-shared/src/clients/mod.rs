pub mod rabbitmq;
pub mod s3;
