pub mod qotd_dto;
