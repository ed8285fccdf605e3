pub mod thread_view;
